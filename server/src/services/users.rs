//! User service.

use std::sync::Arc;

use orderdesk_auth::hash_password;
use orderdesk_common::{NewUser, Page, PageRequest, UserChanges, UserId, UserProfile};
use orderdesk_store::{StoreError, TokenRepository, UserRepository};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::query_cache::{order_key, user_key, users_page_key, QueryCache};
use crate::services::validation::{FieldValidator, MAX_STRING_LEN, MIN_PASSWORD_LEN};

const MSG_EMAIL_TAKEN: &str = "O email informado já está em uso.";

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    cache: QueryCache,
}

fn email_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::Validation(
            orderdesk_common::ValidationErrors::single("email", MSG_EMAIL_TAKEN),
        ),
        other => other.into(),
    }
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        cache: QueryCache,
    ) -> Self {
        Self {
            users,
            tokens,
            cache,
        }
    }

    #[instrument(skip(self), fields(page = page.page))]
    pub async fn list(&self, page: PageRequest) -> ApiResult<Page<UserProfile>> {
        let users = self.users.clone();

        let page = self
            .cache
            .remember(&users_page_key(page.page), || async move {
                let page = users.list(page).await?;
                Ok::<_, StoreError>(Some(page.map(UserProfile::from)))
            })
            .await?;

        page.ok_or_else(|| ApiError::Internal("user page missing after load".to_string()))
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: UserPayload) -> ApiResult<UserProfile> {
        let mut v = FieldValidator::new();

        let name = v.string("name", "nome", payload.name.as_ref(), true, MAX_STRING_LEN);
        let email = v.email("email", payload.email.as_ref(), true);
        let password = v.secret(
            "password",
            "senha",
            payload.password.as_ref(),
            true,
            MIN_PASSWORD_LEN,
        );

        if let Some(email) = &email {
            if self.users.email_taken(email, None).await? {
                v.error("email", MSG_EMAIL_TAKEN);
            }
        }
        v.finish()?;

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(ApiError::Internal("validated user fields missing".to_string()));
        };

        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash: hash_password(&password)?,
            })
            .await
            .map_err(email_conflict)?;

        info!(user_id = %user.id, "User created");
        Ok(user.into())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn show(&self, id: UserId) -> ApiResult<UserProfile> {
        let users = self.users.clone();

        self.cache
            .remember(&user_key(id), || async move {
                Ok::<_, StoreError>(users.find(id).await?.map(UserProfile::from))
            })
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    /// Apply supplied fields. An empty or absent password keeps the old one.
    #[instrument(skip(self, payload), fields(user_id = %id))]
    pub async fn update(&self, id: UserId, payload: UserPayload) -> ApiResult<UserProfile> {
        if self.users.find(id).await?.is_none() {
            return Err(ApiError::UserNotFound);
        }

        let mut v = FieldValidator::new();

        let name = v.string("name", "nome", payload.name.as_ref(), false, MAX_STRING_LEN);
        let email = v.email("email", payload.email.as_ref(), false);
        let password = match payload.password.as_ref() {
            Some(Value::String(s)) if s.is_empty() => None,
            other => v.secret("password", "senha", other, false, MIN_PASSWORD_LEN),
        };

        if let Some(email) = &email {
            if self.users.email_taken(email, Some(id)).await? {
                v.error("email", MSG_EMAIL_TAKEN);
            }
        }
        v.finish()?;

        let changes = UserChanges {
            name,
            email,
            password_hash: password.as_deref().map(hash_password).transpose()?,
        };

        let user = self
            .users
            .update(id, changes)
            .await
            .map_err(email_conflict)?
            .ok_or(ApiError::UserNotFound)?;

        self.cache.forget(&user_key(id)).await;
        info!("User updated");

        Ok(user.into())
    }

    /// Remove the user; their orders go with them and their tokens are
    /// revoked. Cached reads of the removed orders are evicted too.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> ApiResult<()> {
        let removed_orders = self
            .users
            .delete(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let revoked = self.tokens.revoke_all_for_user(id).await?;
        self.cache.forget(&user_key(id)).await;
        for order_id in &removed_orders {
            self.cache.forget(&order_key(*order_id)).await;
        }
        info!(
            revoked_tokens = revoked,
            removed_orders = removed_orders.len(),
            "User deleted"
        );

        Ok(())
    }
}
