//! Error types for the Directory API service.
//!
//! Every guard failure surfaces as one stable error code in the JSON body,
//! so client UIs and tests assert on codes rather than message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use blogdex_billing_core::BillingError;
use blogdex_listing_core::ListingError;
use blogdex_verify_core::VerifyError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Database error")]
    Database(#[from] blogdex_db::DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Listing(e) => match e {
                ListingError::DomainNotVerified => StatusCode::FORBIDDEN,
                ListingError::DomainMismatch | ListingError::ReasonRequired => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ListingError::DuplicateUrl
                | ListingError::QuotaExceeded
                | ListingError::InvalidState(_)
                | ListingError::TransitionConflict => StatusCode::CONFLICT,
                ListingError::SubmissionNotFound | ListingError::BloggerNotFound => {
                    StatusCode::NOT_FOUND
                }
                ListingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Verify(e) => match e {
                VerifyError::NotDeclared
                | VerifyError::NoChallenge
                | VerifyError::AlreadyVerified => StatusCode::CONFLICT,
                VerifyError::InvalidUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
                VerifyError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Billing(e) => match e {
                BillingError::BloggerNotFound => StatusCode::NOT_FOUND,
                BillingError::WebhookError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Listing(e) => e.error_code(),
            Self::Verify(e) => e.error_code(),
            Self::Billing(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
