//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use blogdex_types::{
    BillingRecord, BloggerId, DomainVerification, Submission, SubmissionId,
};

use crate::error::{DbError, DbResult};

/// Blogger row from the database
#[derive(Debug, Clone, FromRow)]
pub struct BloggerRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub declared_blog_url: Option<String>,
    pub customer_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain verification row from the database (1:1 with blogger)
#[derive(Debug, Clone, FromRow)]
pub struct DomainVerificationRow {
    pub blogger_id: Uuid,
    pub domain: String,
    pub method: Option<String>,
    pub token: Option<String>,
    pub status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub blogger_id: Uuid,
    pub post_url: String,
    pub status: String,
    pub is_active: bool,
    pub url_change_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub last_activated_at: Option<DateTime<Utc>>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Billing record row from the database (1:1 with blogger)
#[derive(Debug, Clone, FromRow)]
pub struct BillingRow {
    pub blogger_id: Uuid,
    pub status: String,
    pub period_end: DateTime<Utc>,
    pub failure_notice_stage: String,
    pub customer_ref: String,
    pub subscription_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Applied billing event row (idempotency ledger)
#[derive(Debug, Clone, FromRow)]
pub struct BillingEventRow {
    pub event_id: String,
    pub blogger_id: Uuid,
    pub event_type: String,
    pub applied_at: DateTime<Utc>,
}

/// Notification ledger row (at-most-once dispatch)
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub transition_key: String,
    pub recipient: String,
    pub template_id: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversion implementations from row types to blogdex-types domain types

impl BloggerRow {
    /// Convert to domain BloggerId
    pub fn blogger_id(&self) -> BloggerId {
        BloggerId(self.id)
    }
}

impl DomainVerificationRow {
    /// Convert to the domain verification type
    pub fn to_domain(&self) -> DbResult<DomainVerification> {
        let method = match &self.method {
            Some(m) => Some(m.parse().map_err(|_| decode("method", m))?),
            None => None,
        };
        Ok(DomainVerification {
            blogger_id: BloggerId(self.blogger_id),
            domain: self.domain.clone(),
            method,
            token: self.token.clone(),
            status: self
                .status
                .parse()
                .map_err(|_| decode("status", &self.status))?,
            verified_at: self.verified_at,
        })
    }
}

impl SubmissionRow {
    /// Convert to domain SubmissionId
    pub fn submission_id(&self) -> SubmissionId {
        SubmissionId(self.id)
    }

    /// Convert to the domain submission type
    pub fn to_domain(&self) -> DbResult<Submission> {
        Ok(Submission {
            id: SubmissionId(self.id),
            blogger_id: BloggerId(self.blogger_id),
            post_url: self.post_url.clone(),
            status: self
                .status
                .parse()
                .map_err(|_| decode("status", &self.status))?,
            is_active: self.is_active,
            url_change_reason: self.url_change_reason.clone(),
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            last_activated_at: self.last_activated_at,
            revision: self.revision,
            created_at: self.created_at,
        })
    }
}

impl BillingRow {
    /// Convert to the domain billing record type
    pub fn to_domain(&self) -> DbResult<BillingRecord> {
        Ok(BillingRecord {
            blogger_id: BloggerId(self.blogger_id),
            status: self
                .status
                .parse()
                .map_err(|_| decode("status", &self.status))?,
            period_end: self.period_end,
            failure_notice_stage: self
                .failure_notice_stage
                .parse()
                .map_err(|_| decode("failure_notice_stage", &self.failure_notice_stage))?,
            customer_ref: self.customer_ref.clone(),
            subscription_ref: self.subscription_ref.clone(),
            created_at: self.created_at,
        })
    }
}

fn decode(field: &str, value: &str) -> DbError {
    DbError::Decode(format!("{field}: {value}"))
}
