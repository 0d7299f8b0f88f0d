//! Opaque bearer tokens.
//!
//! A token is presented as `{id}|{secret}`. The id locates the stored row,
//! the secret is only ever persisted as its SHA-256 digest.

use std::fmt;
use std::str::FromStr;

use orderdesk_common::TokenId;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::hash::sha256_hex;
use crate::AuthError;

/// Length of the random part of a token.
pub const TOKEN_SECRET_LEN: usize = 40;

/// A freshly generated secret, before it has a row id.
#[derive(Clone)]
pub struct IssuedToken {
    secret: String,
}

impl IssuedToken {
    /// Generate a random alphanumeric secret.
    pub fn generate() -> Self {
        let secret = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_SECRET_LEN)
            .map(char::from)
            .collect();
        Self { secret }
    }

    /// Digest to persist.
    pub fn digest(&self) -> String {
        sha256_hex(self.secret.as_bytes())
    }

    /// Attach the stored row id, producing the value handed to the client.
    pub fn into_plain(self, id: TokenId) -> PlainToken {
        PlainToken {
            id,
            secret: self.secret,
        }
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IssuedToken(..)")
    }
}

/// A token as presented in an `Authorization: Bearer` header.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainToken {
    pub id: TokenId,
    secret: String,
}

impl PlainToken {
    /// Digest of the secret part, for lookup.
    pub fn digest(&self) -> String {
        sha256_hex(self.secret.as_bytes())
    }
}

impl fmt::Display for PlainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.id, self.secret)
    }
}

impl fmt::Debug for PlainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlainToken({}|..)", self.id)
    }
}

impl FromStr for PlainToken {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, secret) = s.split_once('|').ok_or(AuthError::MalformedToken)?;
        let id = id.parse::<TokenId>().map_err(|_| AuthError::MalformedToken)?;

        if secret.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        Ok(Self {
            id,
            secret: secret.to_string(),
        })
    }
}
