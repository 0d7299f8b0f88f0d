//! Redis-backed cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, info};

use crate::{CacheResult, KeyValueCache, MAX_TTL};

/// Cache stored in Redis. Keys are namespaced with a prefix so several
/// deployments can share one database.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str, prefix: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        let prefix = prefix.into();

        info!(prefix = %prefix, "Connected to Redis cache");

        Ok(Self { conn, prefix })
    }

    fn namespaced(&self, key: &str) -> String {
        namespaced_key(&self.prefix, key)
    }
}

fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;

        debug!(key, hit = value.is_some(), "Redis lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        // EX takes whole seconds and rejects 0.
        let seconds = ttl.min(MAX_TTL).as_secs().max(1);
        let _: () = redis::cmd("SET")
            .arg(self.namespaced(key))
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("DEL")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
