//! Blogdex Notify Core - Notification dispatch
//!
//! Maps a lifecycle transition to exactly one outbound message. Delivery is
//! at-most-once per transition key: the ledger row is claimed before the
//! transport is touched, and a duplicate claim is a no-op. Transport
//! failures are logged and recorded for manual resend; they never roll back
//! the state transition that triggered them.

pub mod dispatcher;
pub mod transport;

pub use dispatcher::{Dispatcher, DispatchOutcome, Notifier};
pub use transport::{EmailTransport, HttpEmailTransport, TransportError};
