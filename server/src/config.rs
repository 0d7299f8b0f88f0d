//! Server configuration.

use std::str::FromStr;
use std::time::Duration;

use orderdesk_cache::MAX_TTL;
use orderdesk_common::{constants, DEFAULT_PAGE_SIZE};
use orderdesk_fx::ExchangeRateApiConfig;

/// Which key/value cache backs the rate and query caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDriver {
    /// In-process map.
    Memory,
    /// Shared Redis instance at `REDIS_URL`.
    Redis,
    /// Caching disabled.
    None,
}

impl FromStr for CacheDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "array" => Ok(CacheDriver::Memory),
            "redis" => Ok(CacheDriver::Redis),
            "none" | "null" => Ok(CacheDriver::None),
            other => Err(format!("Unknown cache driver: {}", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub driver: CacheDriver,
    /// Redis connection URL.
    pub redis_url: String,
    /// Prefix for Redis keys.
    pub key_prefix: String,
    /// Exchange rate TTL.
    pub rate_ttl: Duration,
    /// Order and user query TTL.
    pub query_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::Memory,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: "orderdesk".to_string(),
            rate_ttl: constants::rate_cache_ttl(),
            query_ttl: constants::query_cache_ttl(),
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// PostgreSQL URL. Without one the in-memory store is used.
    pub database_url: Option<String>,
    /// Pool size.
    pub database_max_connections: u32,
    /// Cache configuration.
    pub cache: CacheConfig,
    /// Pricing API client configuration.
    pub exchange_rate: ExchangeRateApiConfig,
    /// Orders and users per page.
    pub page_size: u32,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8000,
            database_url: None,
            database_max_connections: 5,
            cache: CacheConfig::default(),
            exchange_rate: ExchangeRateApiConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            log_format: LogFormat::Text,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values keep their defaults, except `CACHE_DRIVER`, which
    /// is reported by [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("SERVER_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = env_parse("SERVER_LISTEN_PORT") {
            config.listen_port = port;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = Some(url);
            }
        }

        if let Some(max) = env_parse("DATABASE_MAX_CONNECTIONS") {
            config.database_max_connections = max;
        }

        if let Ok(driver) = std::env::var("CACHE_DRIVER") {
            config.cache.driver = driver.parse()?;
        }

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.cache.redis_url = url;
        }

        if let Ok(prefix) = std::env::var("CACHE_PREFIX") {
            config.cache.key_prefix = prefix;
        }

        if let Some(secs) = env_parse("RATE_CACHE_TTL_SECS") {
            config.cache.rate_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse("QUERY_CACHE_TTL_SECS") {
            config.cache.query_ttl = Duration::from_secs(secs);
        }

        if let Some(size) = env_parse("PAGE_SIZE") {
            config.page_size = size;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            if format.eq_ignore_ascii_case("json") {
                config.log_format = LogFormat::Json;
            }
        }

        config.exchange_rate = ExchangeRateApiConfig::from_env();

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.page_size == 0 {
            return Err("Page size must be at least 1".to_string());
        }

        if self.database_max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.cache.driver == CacheDriver::Redis && self.cache.redis_url.is_empty() {
            return Err("REDIS_URL is required when CACHE_DRIVER=redis".to_string());
        }

        if self.cache.rate_ttl > MAX_TTL || self.cache.query_ttl > MAX_TTL {
            return Err(format!(
                "Cache TTLs cannot exceed {} seconds",
                MAX_TTL.as_secs()
            ));
        }

        if self.exchange_rate.timeout.is_zero() {
            return Err("Exchange rate timeout cannot be 0".to_string());
        }

        Ok(())
    }

    /// `addr:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}
