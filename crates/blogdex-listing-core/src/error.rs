//! Listing errors

use thiserror::Error;

/// Submission lifecycle errors
///
/// Guard failures are ordinary return values here, never control-flow
/// exceptions: each maps to one stable code the UI and tests assert on.
#[derive(Error, Debug)]
pub enum ListingError {
    /// The blogger's domain is not verified
    #[error("domain not verified")]
    DomainNotVerified,

    /// The URL's host is not the verified domain or a subdomain of it
    #[error("URL does not match the verified domain")]
    DomainMismatch,

    /// The URL is already used by another submission
    #[error("URL already submitted")]
    DuplicateUrl,

    /// Activating would exceed the tier's active-post quota
    #[error("active post quota exceeded")]
    QuotaExceeded,

    /// Submission not found
    #[error("submission not found")]
    SubmissionNotFound,

    /// Blogger not found
    #[error("blogger not found")]
    BloggerNotFound,

    /// A post-approval URL change needs a reason
    #[error("URL change reason required")]
    ReasonRequired,

    /// The event is not legal in the submission's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A concurrent writer won the race twice; the caller should retry
    #[error("transition conflict, try again")]
    TransitionConflict,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] blogdex_db::DbError),
}

impl ListingError {
    /// Get the stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DomainNotVerified => "DOMAIN_NOT_VERIFIED",
            Self::DomainMismatch => "DOMAIN_MISMATCH",
            Self::DuplicateUrl => "DUPLICATE_URL",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::SubmissionNotFound => "SUBMISSION_NOT_FOUND",
            Self::BloggerNotFound => "BLOGGER_NOT_FOUND",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::TransitionConflict => "TRANSITION_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
