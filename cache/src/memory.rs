//! In-process cache with TTL support.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::{CacheResult, KeyValueCache, MAX_TTL};

/// Cached entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Configuration for the in-process cache.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Entry count that triggers a sweep of expired entries on insert.
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10000 }
    }
}

/// Thread-safe key/value cache with per-entry TTL.
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    config: MemoryCacheConfig,
}

impl MemoryCache {
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryCacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.is_valid());
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let valid = self.entries.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_valid() {
                debug!(key, "Cache hit");
                return Ok(Some(entry.value.clone()));
            }
            debug!(key, "Cache entry expired");
            drop(entry);
            self.entries.remove_if(key, |_, entry| !entry.is_valid());
        }

        debug!(key, "Cache miss");
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        if self.entries.len() >= self.config.max_entries {
            self.evict_expired();
        }

        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
