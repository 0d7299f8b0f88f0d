//! User handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use orderdesk_common::{PageRequest, UserId};
use serde_json::json;

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{BearerAuth, JsonBody};
use crate::services::UserPayload;
use crate::state::AppState;

fn parse_id(raw: &str) -> ApiResult<UserId> {
    raw.parse().map_err(|_| ApiError::UserNotFound)
}

pub async fn index(
    State(state): State<AppState>,
    BearerAuth(_caller): BearerAuth,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageRequest::from_query(query.page.as_deref(), state.page_size);
    Ok(Json(state.users.list(page).await?))
}

pub async fn store(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.show(parse_id(&id)?).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.update(parse_id(&id)?, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.users.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "message": "Usuário excluído com sucesso" })))
}
