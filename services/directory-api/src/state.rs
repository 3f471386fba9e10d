//! Application state for the Directory API service.

use std::sync::Arc;

use blogdex_billing_core::SubscriptionLifecycle;
use blogdex_db::pg::{
    PgBillingRepository, PgBloggerRepository, PgNotificationRepository, PgSubmissionRepository,
    PgVerificationRepository,
};
use blogdex_db::{DbPool, Repositories};
use blogdex_listing_core::ListingService;
use blogdex_verify_core::{HttpProber, VerificationService};

use crate::config::Config;

/// Listing service over the Postgres repositories
pub type Listing = ListingService<
    PgSubmissionRepository,
    PgVerificationRepository,
    PgBillingRepository,
    PgBloggerRepository,
>;

/// Subscription lifecycle over the Postgres repositories
pub type Billing = SubscriptionLifecycle<
    PgSubmissionRepository,
    PgVerificationRepository,
    PgBillingRepository,
    PgBloggerRepository,
>;

/// Verification service over the Postgres repositories
pub type Verification = VerificationService<PgVerificationRepository, HttpProber>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Submission lifecycle (submit, review, URL change, activation)
    pub listing: Arc<Listing>,
    /// Subscription lifecycle (webhooks, checkout, portal)
    pub billing: Arc<Billing>,
    /// Domain verification (declare, challenge, verify)
    pub verification: Arc<Verification>,
    /// Notification ledger, for the manual-resend surface
    pub notifications: PgNotificationRepository,
    /// Database repositories (for direct access if needed)
    pub repos: Repositories,
    /// Database pool (readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
