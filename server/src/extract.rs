//! Request extractors.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use orderdesk_common::ValidationErrors;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::services::AuthenticatedUser;
use crate::state::AppState;

/// Axum extractor for `Authorization: Bearer <token>`.
///
/// Rejects with 401 when the header is missing or malformed, or the token
/// is unknown or revoked.
pub struct BearerAuth(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = bearer_token(header).ok_or(ApiError::Unauthenticated)?;

        let caller = state.auth.authenticate(token).await?;
        debug!(user_id = %caller.user.id, "Authenticated request");

        Ok(BearerAuth(caller))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// JSON body whose parse failures become a 422 instead of axum's default
/// rejection.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ApiError::Validation(ValidationErrors::single(
                    "body",
                    "O corpo da requisição deve ser um JSON válido.",
                )))
            }
        }
    }
}
