//! OrderDesk Credentials
//!
//! Password hashing and opaque bearer tokens.

pub mod hash;
pub mod password;
pub mod token;

pub use hash::{sha256, sha256_hex};
pub use password::{hash_password, verify_password};
pub use token::{IssuedToken, PlainToken, TOKEN_SECRET_LEN};

/// Errors from credential operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Malformed bearer token")]
    MalformedToken,
}

pub type Result<T> = std::result::Result<T, AuthError>;
