//! OrderDesk Server
//!
//! HTTP API for orders and users. Single-order reads are enriched with a
//! BRL/USD conversion, and order/user reads go through a short-lived query
//! cache that writes invalidate.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod query_cache;
pub mod routes;
pub mod services;
pub mod state;

pub use app::{build_cache, build_repositories, build_state};
pub use config::{CacheDriver, LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
