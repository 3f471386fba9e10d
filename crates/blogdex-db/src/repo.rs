//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Blogger repository trait
#[async_trait]
pub trait BloggerRepository: Send + Sync {
    /// Find a blogger by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<BloggerRow>>;

    /// Find a blogger by payment-processor customer reference
    async fn find_by_customer_ref(&self, customer_ref: &str) -> DbResult<Option<BloggerRow>>;

    /// Create a new blogger
    async fn create(&self, blogger: CreateBlogger) -> DbResult<BloggerRow>;

    /// Record the declared blog URL
    async fn set_declared_blog_url(&self, id: Uuid, url: &str) -> DbResult<()>;

    /// Record the payment-processor customer reference
    async fn set_customer_ref(&self, id: Uuid, customer_ref: &str) -> DbResult<()>;
}

/// Create blogger input
#[derive(Debug, Clone)]
pub struct CreateBlogger {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Domain verification repository trait (one record per blogger)
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Find the verification record for a blogger
    async fn find_by_blogger_id(&self, blogger_id: Uuid) -> DbResult<Option<DomainVerificationRow>>;

    /// Create the record for `domain`, or reset an existing one to it.
    ///
    /// Resetting clears any outstanding challenge and drops the status
    /// back to `unverified`.
    async fn reset_domain(&self, blogger_id: Uuid, domain: &str)
        -> DbResult<DomainVerificationRow>;

    /// Store an issued challenge and move the record to `pending`
    async fn set_challenge(&self, blogger_id: Uuid, method: &str, token: &str) -> DbResult<()>;

    /// Move the record to `verified`
    async fn mark_verified(&self, blogger_id: Uuid) -> DbResult<()>;
}

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Find a submission by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubmissionRow>>;

    /// Find a submission by post URL (URLs are globally unique)
    async fn find_by_post_url(&self, post_url: &str) -> DbResult<Option<SubmissionRow>>;

    /// List all submissions for a blogger
    async fn list_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>>;

    /// List a blogger's publicly listed submissions (approved and active)
    async fn list_listed_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>>;

    /// Count a blogger's publicly listed submissions
    async fn count_listed(&self, blogger_id: Uuid) -> DbResult<i64>;

    /// Create a new submission
    async fn create(&self, sub: CreateSubmission) -> DbResult<SubmissionRow>;

    /// Apply a state transition guarded by the expected status and revision.
    ///
    /// Returns the updated row, or `None` when the guard missed because a
    /// concurrent writer got there first. The revision is always bumped.
    async fn apply_transition(
        &self,
        id: Uuid,
        expected_status: &str,
        expected_revision: i32,
        change: SubmissionChange,
    ) -> DbResult<Option<SubmissionRow>>;
}

/// Create submission input
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub id: Uuid,
    pub blogger_id: Uuid,
    pub post_url: String,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Field changes carried by a submission transition.
///
/// `None` leaves the column untouched; transitions never null a column
/// out, so plain options are enough.
#[derive(Debug, Clone, Default)]
pub struct SubmissionChange {
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub post_url: Option<String>,
    pub url_change_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub last_activated_at: Option<DateTime<Utc>>,
}

/// Billing repository trait (one record per blogger, plus the event ledger)
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Find the billing record for a blogger
    async fn find_by_blogger_id(&self, blogger_id: Uuid) -> DbResult<Option<BillingRow>>;

    /// Create the billing record, or replace an existing (e.g. canceled) one
    async fn upsert(&self, rec: UpsertBillingRecord) -> DbResult<BillingRow>;

    /// Update status, period end, and failure-notice stage
    async fn update_status(
        &self,
        blogger_id: Uuid,
        status: &str,
        period_end: Option<DateTime<Utc>>,
        failure_notice_stage: &str,
    ) -> DbResult<()>;

    /// Record an externally-numbered event as applied.
    ///
    /// Returns `false` when the event id was already recorded, which makes
    /// webhook replays no-ops.
    async fn record_event(&self, event_id: &str, blogger_id: Uuid, event_type: &str)
        -> DbResult<bool>;
}

/// Upsert billing record input
#[derive(Debug, Clone)]
pub struct UpsertBillingRecord {
    pub blogger_id: Uuid,
    pub status: String,
    pub period_end: DateTime<Utc>,
    pub failure_notice_stage: String,
    pub customer_ref: String,
    pub subscription_ref: Option<String>,
}

/// Notification ledger repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Claim a transition key for dispatch.
    ///
    /// Returns `false` when the key is already claimed — the transition
    /// has been notified (or is being notified) and must not be re-sent.
    async fn begin_dispatch(&self, rec: CreateNotification) -> DbResult<bool>;

    /// Mark a claimed dispatch as delivered
    async fn mark_sent(&self, transition_key: &str) -> DbResult<()>;

    /// Mark a claimed dispatch as failed, keeping it for manual resend
    async fn mark_failed(&self, transition_key: &str, error: &str) -> DbResult<()>;

    /// List failed dispatches for manual resend
    async fn list_failed(&self, limit: i64) -> DbResult<Vec<NotificationRow>>;
}

/// Create notification input
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub transition_key: String,
    pub recipient: String,
    pub template_id: String,
    pub payload: serde_json::Value,
}
