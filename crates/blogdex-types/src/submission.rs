//! Submission lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BloggerId, SubmissionId};

/// Submission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Saved but not yet submitted for review
    Draft,
    /// Awaiting human review
    Pending,
    /// Accepted by a reviewer; may be toggled active subject to quota
    Approved,
    /// Declined by a reviewer; terminal — resubmission mints a new id
    Rejected,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = SubmissionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(SubmissionStatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a submission status string
#[derive(Debug, Clone)]
pub struct SubmissionStatusParseError(pub String);

impl std::fmt::Display for SubmissionStatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid submission status: {}", self.0)
    }
}

impl std::error::Error for SubmissionStatusParseError {}

/// A blog post submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Submission ID
    pub id: SubmissionId,
    /// Blogger who owns the submission
    pub blogger_id: BloggerId,
    /// Post URL; globally unique across all submissions
    pub post_url: String,
    /// Lifecycle status
    pub status: SubmissionStatus,
    /// Whether the post is publicly listed; meaningful only when approved
    pub is_active: bool,
    /// Reason recorded when the URL of an approved submission is edited
    pub url_change_reason: Option<String>,
    /// When the submission entered review for the first time
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the submission was last reviewed
    pub reviewed_at: Option<DateTime<Utc>>,
    /// When the submission was last (re)activated
    pub last_activated_at: Option<DateTime<Utc>>,
    /// Monotonic transition counter; keys per-transition notifications
    pub revision: i32,
    /// When the submission was created
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Whether the submission counts against the active-post quota
    pub fn is_listed(&self) -> bool {
        self.status == SubmissionStatus::Approved && self.is_active
    }
}

/// A reviewer's decision on a pending submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the submission for listing
    Approve,
    /// Decline the submission with a reason shown to the blogger
    Reject { reason: String },
}
