//! HTTP routes.

pub mod auth;
pub mod orders;
pub mod status;
pub mod users;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// `?page=` query parameter. Kept as text so junk means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Build the application router. Every route is served both at the root
/// and under `/api`.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/users", get(users::index).post(users::store))
        .route(
            "/users/:id",
            get(users::show).put(users::update).delete(users::destroy),
        )
        .route("/orders", get(orders::index).post(orders::store))
        .route(
            "/orders/:id",
            get(orders::show).put(orders::update).delete(orders::destroy),
        )
        .route("/status", get(status::status))
        .route("/metrics", get(status::metrics));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
