//! Blogdex Listing Core - Submission lifecycle and entitlement policy
//!
//! The submission state machine (draft → pending → approved/rejected, with
//! an activity flag on approved submissions), the quota policy derived from
//! the subscription tier, and the deterministic deactivation selection that
//! runs when a blogger's quota shrinks.
//!
//! All mutations of a single blogger's submission set are serialized
//! through [`BloggerLocks`], so the "active count never exceeds quota"
//! invariant is never observably violated, even transiently.

pub mod entitlement;
pub mod error;
pub mod locks;
pub mod service;

pub use entitlement::select_deactivations;
pub use error::ListingError;
pub use locks::BloggerLocks;
pub use service::ListingService;
