//! JSON helpers over [`KeyValueCache`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::{CacheResult, KeyValueCache};

/// Read and decode a cached value.
pub async fn get<T: DeserializeOwned>(
    cache: &dyn KeyValueCache,
    key: &str,
) -> CacheResult<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and store a value.
pub async fn set<T: Serialize + ?Sized>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> CacheResult<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}

/// Read a cached value, treating backend and decode failures as a miss.
pub async fn get_or_miss<T: DeserializeOwned>(cache: &dyn KeyValueCache, key: &str) -> Option<T> {
    match get(cache, key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, backend = cache.backend(), error = %e, "Cache read failed, treating as miss");
            None
        }
    }
}

/// Store a value, logging instead of failing.
pub async fn set_or_warn<T: Serialize + ?Sized>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    if let Err(e) = set(cache, key, value, ttl).await {
        warn!(key, backend = cache.backend(), error = %e, "Cache write failed");
    }
}

/// Delete a key, logging instead of failing.
pub async fn delete_or_warn(cache: &dyn KeyValueCache, key: &str) {
    if let Err(e) = cache.delete(key).await {
        warn!(key, backend = cache.backend(), error = %e, "Cache delete failed");
    }
}
