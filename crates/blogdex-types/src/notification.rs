//! Notification templates
//!
//! Every lifecycle transition maps to at most one of these templates. The
//! dispatcher keys delivery on a stable transition key, so the templates
//! themselves carry only display payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Outbound notification, one per lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Submission received and queued for review
    SubmissionReceived { post_url: String },
    /// Submission approved by a reviewer
    SubmissionApproved { post_url: String },
    /// Submission rejected by a reviewer
    SubmissionRejected { post_url: String, reason: String },
    /// URL edited post-approval; listing suspended pending re-review
    UrlChanged { old_url: String, new_url: String },
    /// First successful checkout
    Welcome,
    /// Invoice paid
    PaymentSucceeded { period_end: DateTime<Utc> },
    /// First payment failure; the processor will retry
    PaymentRetry { retry_at: Option<DateTime<Utc>> },
    /// Repeated payment failure; downgrade date is now fixed
    FinalNotice { downgrade_at: DateTime<Utc> },
    /// Posts deactivated because the quota shrank
    PostsDelisted { count: u32 },
}

impl NotificationTemplate {
    /// Stable template identifier understood by the email transport
    pub fn template_id(&self) -> &'static str {
        match self {
            Self::SubmissionReceived { .. } => "submission_received",
            Self::SubmissionApproved { .. } => "submission_approved",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::UrlChanged { .. } => "url_changed",
            Self::Welcome => "welcome",
            Self::PaymentSucceeded { .. } => "payment_succeeded",
            Self::PaymentRetry { .. } => "payment_retry",
            Self::FinalNotice { .. } => "final_notice",
            Self::PostsDelisted { .. } => "posts_delisted",
        }
    }

    /// Structured payload handed to the email transport
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::SubmissionReceived { post_url } => json!({ "post_url": post_url }),
            Self::SubmissionApproved { post_url } => json!({ "post_url": post_url }),
            Self::SubmissionRejected { post_url, reason } => {
                json!({ "post_url": post_url, "reason": reason })
            }
            Self::UrlChanged { old_url, new_url } => {
                json!({ "old_url": old_url, "new_url": new_url })
            }
            Self::Welcome => json!({}),
            Self::PaymentSucceeded { period_end } => {
                json!({ "period_end": period_end.to_rfc3339() })
            }
            Self::PaymentRetry { retry_at } => {
                json!({ "retry_at": retry_at.map(|t| t.to_rfc3339()) })
            }
            Self::FinalNotice { downgrade_at } => {
                json!({ "downgrade_at": downgrade_at.to_rfc3339() })
            }
            Self::PostsDelisted { count } => json!({ "count": count }),
        }
    }
}
