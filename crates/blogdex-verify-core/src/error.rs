//! Verification errors

use thiserror::Error;

/// Domain verification errors
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The blogger has not declared a blog URL yet
    #[error("no blog URL declared")]
    NotDeclared,

    /// No challenge has been issued for the current domain
    #[error("no outstanding challenge")]
    NoChallenge,

    /// The domain is already verified; a new challenge would only regress it
    #[error("domain already verified")]
    AlreadyVerified,

    /// The supplied URL could not be parsed into a usable blog URL
    #[error("invalid blog URL: {0}")]
    InvalidUrl(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] blogdex_db::DbError),
}

impl VerifyError {
    /// Get the stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotDeclared => "NOT_DECLARED",
            Self::NoChallenge => "NO_CHALLENGE",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
