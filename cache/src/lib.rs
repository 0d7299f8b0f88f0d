//! OrderDesk Cache
//!
//! Key/value cache abstraction used for cache-aside reads.
//!
//! # Backends
//!
//! - [`MemoryCache`]: in-process map with per-entry TTL
//! - [`RedisCache`]: shared Redis instance, TTL via `SET .. EX`
//! - [`NullCache`]: stores nothing, every read is a miss
//!
//! # Example
//!
//! ```rust,ignore
//! use orderdesk_cache::{json, MemoryCache, SharedCache};
//!
//! let cache: SharedCache = Arc::new(MemoryCache::new());
//! json::set(cache.as_ref(), "order_1", &order, Duration::from_secs(60)).await?;
//! let cached: Option<Order> = json::get(cache.as_ref(), "order_1").await?;
//! ```

pub mod error;
pub mod json;
pub mod memory;
pub mod redis_cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use error::{CacheError, CacheResult};
pub use memory::{CacheStats, MemoryCache, MemoryCacheConfig};
pub use redis_cache::RedisCache;

/// Longest TTL any backend honours. Longer TTLs are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A string key/value store with per-entry expiry.
///
/// Implementations provide atomic get/set/delete per key; there are no
/// cross-key guarantees.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Get a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Shared cache handle.
pub type SharedCache = Arc<dyn KeyValueCache>;

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl KeyValueCache for NullCache {
    fn backend(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_never_hits() {
        let cache = NullCache;
        cache
            .set("key", "value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("key").await.unwrap(), None);
        assert!(cache.delete("key").await.is_ok());
    }
}
