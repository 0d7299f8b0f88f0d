//! Login, logout and bearer token resolution.

use std::sync::Arc;

use orderdesk_auth::{verify_password, IssuedToken, PlainToken};
use orderdesk_common::{TokenId, UserProfile};
use orderdesk_store::{TokenRepository, UserRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics::SharedMetrics;
use crate::services::validation::{FieldValidator, MAX_STRING_LEN};

/// Name recorded on tokens issued by login.
pub const TOKEN_NAME: &str = "api-token";

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// The caller behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserProfile,
    pub token_id: TokenId,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    metrics: SharedMetrics,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            users,
            tokens,
            metrics,
        }
    }

    /// Check credentials and issue a new token.
    #[instrument(skip_all)]
    pub async fn login(&self, payload: LoginPayload) -> ApiResult<LoginResponse> {
        let mut v = FieldValidator::new();
        let email = v.email("email", payload.email.as_ref(), true);
        let password = v.string("password", "senha", payload.password.as_ref(), true, MAX_STRING_LEN);
        v.finish()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(ApiError::Internal("validated login fields missing".to_string()));
        };

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(&user.password_hash, &password)? => user,
            _ => {
                self.metrics.login(false);
                warn!(email = %email, "Invalid credentials");
                return Err(ApiError::InvalidCredentials);
            }
        };

        let issued = IssuedToken::generate();
        let token_id = self.tokens.store(user.id, TOKEN_NAME, &issued.digest()).await?;
        let access_token = issued.into_plain(token_id).to_string();

        self.metrics.login(true);
        info!(user_id = %user.id, token_id = %token_id, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            user: user.profile(),
        })
    }

    /// Resolve a raw bearer token to its user.
    pub async fn authenticate(&self, raw: &str) -> ApiResult<AuthenticatedUser> {
        let token: PlainToken = raw.trim().parse().map_err(|_| ApiError::Unauthenticated)?;

        let user_id = self
            .tokens
            .resolve(token.id, &token.digest())
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        let user = self
            .users
            .find(user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthenticatedUser {
            user: user.profile(),
            token_id: token.id,
        })
    }

    /// Revoke the token the caller authenticated with.
    #[instrument(skip_all, fields(user_id = %caller.user.id, token_id = %caller.token_id))]
    pub async fn logout(&self, caller: &AuthenticatedUser) -> ApiResult<()> {
        self.tokens.revoke(caller.token_id).await?;
        info!("User logged out");
        Ok(())
    }
}
