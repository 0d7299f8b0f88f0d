//! Order handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use orderdesk_common::{OrderId, PageRequest};
use serde_json::json;

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{BearerAuth, JsonBody};
use crate::services::OrderPayload;
use crate::state::AppState;

fn parse_id(raw: &str) -> ApiResult<OrderId> {
    raw.parse().map_err(|_| ApiError::OrderNotFound)
}

pub async fn index(
    State(state): State<AppState>,
    BearerAuth(caller): BearerAuth,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageRequest::from_query(query.page.as_deref(), state.page_size);
    Ok(Json(state.orders.list(caller.user.id, page).await?))
}

pub async fn store(
    State(state): State<AppState>,
    BearerAuth(caller): BearerAuth,
    JsonBody(payload): JsonBody<OrderPayload>,
) -> ApiResult<impl IntoResponse> {
    let order = state.orders.create(caller.user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.orders.show(parse_id(&id)?).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<OrderPayload>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.orders.update(parse_id(&id)?, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.orders.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "message": "Pedido excluído com sucesso" })))
}
