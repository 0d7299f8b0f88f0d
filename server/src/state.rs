//! Shared application state.

use std::sync::Arc;

use orderdesk_fx::CurrencyConverter;

use crate::metrics::SharedMetrics;
use crate::services::{AuthService, OrderService, UserService};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub converter: Arc<CurrencyConverter>,
    pub metrics: SharedMetrics,
    /// Name of the cache backend in use.
    pub cache_backend: &'static str,
    /// Orders and users per page.
    pub page_size: u32,
}
