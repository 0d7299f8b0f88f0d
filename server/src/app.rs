//! Wiring: backends from configuration, services from backends.

use std::sync::Arc;

use orderdesk_cache::{CacheResult, MemoryCache, NullCache, RedisCache, SharedCache};
use orderdesk_fx::{ConverterConfig, CurrencyConverter, RateClient};
use orderdesk_store::{PgStore, Repositories, StoreResult};
use tracing::{info, warn};

use crate::config::{CacheConfig, CacheDriver, ServerConfig};
use crate::metrics::Metrics;
use crate::query_cache::QueryCache;
use crate::services::{AuthService, OrderService, UserService};
use crate::state::AppState;

/// Open the configured cache backend.
pub async fn build_cache(config: &CacheConfig) -> CacheResult<SharedCache> {
    let cache: SharedCache = match config.driver {
        CacheDriver::Memory => Arc::new(MemoryCache::new()),
        CacheDriver::Redis => {
            Arc::new(RedisCache::connect(&config.redis_url, config.key_prefix.clone()).await?)
        }
        CacheDriver::None => Arc::new(NullCache),
    };

    info!(backend = cache.backend(), "Cache ready");
    Ok(cache)
}

/// Open PostgreSQL and apply migrations, or fall back to the in-memory store.
pub async fn build_repositories(config: &ServerConfig) -> StoreResult<Repositories> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            Ok(Repositories::postgres(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(Repositories::in_memory())
        }
    }
}

/// Assemble services over the given backends.
pub fn build_state(
    config: &ServerConfig,
    repos: Repositories,
    cache: SharedCache,
    rate_client: Arc<dyn RateClient>,
) -> AppState {
    let metrics = Arc::new(Metrics::new());

    let converter = Arc::new(CurrencyConverter::new(
        rate_client,
        cache.clone(),
        ConverterConfig {
            rate_ttl: config.cache.rate_ttl,
            ..ConverterConfig::default()
        },
    ));

    let query_cache = QueryCache::new(cache.clone(), config.cache.query_ttl, metrics.clone());

    AppState {
        orders: Arc::new(OrderService::new(
            repos.orders.clone(),
            repos.users.clone(),
            query_cache.clone(),
            converter.clone(),
            metrics.clone(),
        )),
        users: Arc::new(UserService::new(
            repos.users.clone(),
            repos.tokens.clone(),
            query_cache,
        )),
        auth: Arc::new(AuthService::new(repos.users, repos.tokens, metrics.clone())),
        converter,
        metrics,
        cache_backend: cache.backend(),
        page_size: config.page_size,
    }
}
