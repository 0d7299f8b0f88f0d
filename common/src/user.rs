//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A persisted user, including the password hash.
///
/// Deliberately not `Serialize`: responses go through [`UserProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields required to create a user. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update of a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(1),
            name: "João da Silva".to_string(),
            email: "joao@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(json["email"], "joao@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_changes_keep_password_when_absent() {
        let now = Utc::now();
        let mut user = User {
            id: UserId::new(1),
            name: "Old".to_string(),
            email: "old@example.com".to_string(),
            password_hash: "hash-1".to_string(),
            created_at: now,
            updated_at: now,
        };

        UserChanges {
            name: Some("New".to_string()),
            ..Default::default()
        }
        .apply(&mut user, now);

        assert_eq!(user.name, "New");
        assert_eq!(user.password_hash, "hash-1");
    }
}
