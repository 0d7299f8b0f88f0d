//! Currency converter: cache-aside rate lookup with an identity fallback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orderdesk_cache::SharedCache;
use orderdesk_common::{constants, Currency, CurrencyPair};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::RateCache;
use crate::conversion::ConversionResult;
use crate::error::{FxError, FxResult};
use crate::provider::{check_rate, RateClient};

/// Configuration for the converter.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// How long fetched rates stay cached.
    pub rate_ttl: Duration,
    /// Whether to consult the rate cache at all.
    pub use_cache: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            rate_ttl: constants::rate_cache_ttl(),
            use_cache: true,
        }
    }
}

/// Counters for rate lookups.
#[derive(Debug, Default)]
pub struct ConverterStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_failures: AtomicU64,
}

/// Point-in-time copy of [`ConverterStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConverterStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_failures: u64,
}

impl ConverterStats {
    pub fn snapshot(&self) -> ConverterStatsSnapshot {
        ConverterStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}

/// Converts order values between BRL and USD.
pub struct CurrencyConverter {
    client: Arc<dyn RateClient>,
    cache: RateCache,
    config: ConverterConfig,
    stats: ConverterStats,
}

impl CurrencyConverter {
    /// Create a converter over a rate client and a shared cache.
    pub fn new(client: Arc<dyn RateClient>, cache: SharedCache, config: ConverterConfig) -> Self {
        Self {
            client,
            cache: RateCache::with_ttl(cache, config.rate_ttl),
            config,
            stats: ConverterStats::default(),
        }
    }

    /// Convert `amount` from `from` into its counterpart currency.
    ///
    /// Never fails: when no rate can be obtained the result is an identity
    /// conversion with `error` set.
    #[instrument(skip(self), fields(from = %from, amount = %amount))]
    pub async fn convert(&self, amount: Decimal, from: Currency) -> ConversionResult {
        let pair = CurrencyPair::swap_from(from);

        let outcome = self.rate(&pair).await.and_then(|rate| {
            ConversionResult::converted(amount, from, rate).ok_or_else(|| FxError::InvalidRate {
                pair,
                rate: rate.to_string(),
            })
        });

        match outcome {
            Ok(result) => result,
            Err(e) => {
                self.stats.upstream_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    pair = %pair,
                    client = self.client.name(),
                    error = %e,
                    "Exchange rate unavailable, using identity conversion"
                );
                ConversionResult::degraded(amount, from, e.to_string())
            }
        }
    }

    /// Get the rate for a pair, from cache or upstream.
    ///
    /// Only successful fetches within [`MAX_RATE`](crate::provider::MAX_RATE)
    /// are cached, and cached values outside that range read as a miss.
    pub async fn rate(&self, pair: &CurrencyPair) -> FxResult<Decimal> {
        if self.config.use_cache {
            let cached = self
                .cache
                .get(pair)
                .await
                .filter(|rate| check_rate(pair, *rate).is_ok());
            if let Some(rate) = cached {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(pair = %pair, "Rate cache hit");
                return Ok(rate);
            }
            self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            debug!(pair = %pair, "Rate cache miss");
        }

        let rate = check_rate(pair, self.client.fetch_rate(pair).await?)?;

        if self.config.use_cache {
            self.cache.insert(pair, rate).await;
        }

        Ok(rate)
    }

    /// Lookup counters.
    pub fn stats(&self) -> ConverterStatsSnapshot {
        self.stats.snapshot()
    }
}
