//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Blogger not found
    #[error("blogger not found")]
    BloggerNotFound,

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Quota enforcement failed while applying a downgrade
    #[error("listing error: {0}")]
    Listing(#[from] blogdex_listing_core::ListingError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] blogdex_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Whether this error came from verifying or parsing a webhook payload.
    ///
    /// The webhook endpoint answers 400 for these (the processor must not
    /// retry a payload that can never verify) and 500 for everything else.
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(self, Self::WebhookError(_))
    }

    /// Get the stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BloggerNotFound => "BLOGGER_NOT_FOUND",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::ProviderError(_) => "PROVIDER_ERROR",
            Self::Listing(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
