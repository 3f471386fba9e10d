//! Per-blogger write serialization

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-blogger async mutexes.
///
/// Every mutation of a blogger's `(billing record, submission set)` runs
/// under this lock, which is what keeps the quota invariant from being
/// observed violated by a concurrent writer. The registry is shared between
/// the listing service and the subscription lifecycle so both serialize on
/// the same key.
#[derive(Clone, Default)]
pub struct BloggerLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BloggerLocks {
    /// Create an empty lock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one blogger, waiting if another unit of work
    /// holds it
    pub async fn acquire(&self, blogger_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(blogger_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

impl std::fmt::Debug for BloggerLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloggerLocks")
            .field("entries", &self.locks.len())
            .finish()
    }
}
