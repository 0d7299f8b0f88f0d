//! Argon2 password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use tracing::{debug, instrument};

use crate::{AuthError, Result};

/// Hash a plain-text password into a PHC string.
#[instrument(skip(password))]
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

    debug!("Password hashed");
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only an unparseable hash is an error.
#[instrument(skip_all)]
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::InvalidHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("senha123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "senha123").unwrap());
        assert!(!verify_password(&hash, "outra").unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("senha123").unwrap();
        let b = hash_password("senha123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hash_password(""), Err(AuthError::EmptyPassword)));
    }

    #[test]
    fn test_garbage_hash_is_error() {
        assert!(matches!(
            verify_password("not-a-phc-string", "x"),
            Err(AuthError::InvalidHash(_))
        ));
    }
}
