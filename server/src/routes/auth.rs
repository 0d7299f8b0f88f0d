//! Session handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::extract::{BearerAuth, JsonBody};
use crate::services::LoginPayload;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginPayload>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.auth.login(payload).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    BearerAuth(caller): BearerAuth,
) -> ApiResult<impl IntoResponse> {
    state.auth.logout(&caller).await?;
    Ok(Json(json!({ "message": "Logout realizado com sucesso." })))
}

pub async fn me(BearerAuth(caller): BearerAuth) -> impl IntoResponse {
    Json(caller.user)
}
