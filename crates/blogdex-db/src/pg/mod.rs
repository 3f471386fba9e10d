//! PostgreSQL repository implementations

mod billing;
mod blogger;
mod notification;
mod submission;
mod verification;

pub use billing::PgBillingRepository;
pub use blogger::PgBloggerRepository;
pub use notification::PgNotificationRepository;
pub use submission::PgSubmissionRepository;
pub use verification::PgVerificationRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub bloggers: PgBloggerRepository,
    pub verifications: PgVerificationRepository,
    pub submissions: PgSubmissionRepository,
    pub billing: PgBillingRepository,
    pub notifications: PgNotificationRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            bloggers: PgBloggerRepository::new(pool.clone()),
            verifications: PgVerificationRepository::new(pool.clone()),
            submissions: PgSubmissionRepository::new(pool.clone()),
            billing: PgBillingRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool),
        }
    }
}
