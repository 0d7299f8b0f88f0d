//! Health and metrics.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.snapshot();
    let rates = state.converter.stats();

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "backend": state.cache_backend,
            "query_hits": metrics.query_cache_hits,
            "query_misses": metrics.query_cache_misses,
            "rate_hits": rates.cache_hits,
            "rate_misses": rates.cache_misses,
            "rate_upstream_failures": rates.upstream_failures,
        },
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.to_prometheus(&state.converter.stats());
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
