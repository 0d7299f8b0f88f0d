//! Cache error types.

use thiserror::Error;

/// Errors that can occur talking to a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend rejected the command or is unreachable.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A cached payload could not be encoded or decoded.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
