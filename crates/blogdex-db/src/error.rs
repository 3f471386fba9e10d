//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Stored value could not be decoded into a domain type
    #[error("corrupt row: {0}")]
    Decode(String),
}

impl DbError {
    /// Whether this error is a unique-constraint violation.
    ///
    /// The engine leans on unique constraints for the global post-URL
    /// uniqueness rule and the billing-event idempotency ledger, so
    /// callers need to tell this apart from other database failures.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            Self::UniqueViolation(_) => true,
            _ => false,
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
