//! Store error types.

use thiserror::Error;

/// Errors from a repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row could not be decoded into a domain value.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure at startup.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Map unique-constraint violations to [`StoreError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(what.to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
