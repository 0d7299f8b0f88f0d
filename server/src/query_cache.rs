//! Cache-aside for order and user reads.
//!
//! Single-entity keys are invalidated by the services on update/delete.
//! Listing keys are only bounded by the TTL.

use std::future::Future;
use std::time::Duration;

use orderdesk_cache::{json, SharedCache};
use orderdesk_common::{OrderId, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::metrics::SharedMetrics;

pub fn order_key(id: OrderId) -> String {
    format!("order_{}", id)
}

pub fn orders_page_key(owner: UserId, page: u32) -> String {
    format!("orders_user_{}_page_{}", owner, page)
}

pub fn user_key(id: UserId) -> String {
    format!("user_{}", id)
}

pub fn users_page_key(page: u32) -> String {
    format!("users_page_{}", page)
}

/// JSON query results in the shared cache.
#[derive(Clone)]
pub struct QueryCache {
    cache: SharedCache,
    ttl: Duration,
    metrics: SharedMetrics,
}

impl QueryCache {
    pub fn new(cache: SharedCache, ttl: Duration, metrics: SharedMetrics) -> Self {
        Self {
            cache,
            ttl,
            metrics,
        }
    }

    /// Backend name, for status output.
    pub fn backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// Return the cached value under `key`, or run `load` and cache a
    /// `Some` result. `None` results are not cached.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, load: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(value) = json::get_or_miss::<T>(self.cache.as_ref(), key).await {
            self.metrics.query_cache_hit();
            debug!(key, "Query cache hit");
            return Ok(Some(value));
        }

        self.metrics.query_cache_miss();
        debug!(key, "Query cache miss");

        let loaded = load().await?;
        if let Some(value) = &loaded {
            json::set_or_warn(self.cache.as_ref(), key, value, self.ttl).await;
        }
        Ok(loaded)
    }

    /// Drop a cached entry.
    pub async fn forget(&self, key: &str) {
        json::delete_or_warn(self.cache.as_ref(), key).await;
    }
}
