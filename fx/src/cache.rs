//! Exchange rate cache.

use std::time::Duration;

use orderdesk_cache::{json, SharedCache};
use orderdesk_common::{constants, CurrencyPair};
use rust_decimal::Decimal;
use tracing::trace;

/// Cache key for a currency pair, e.g. `exchange_rate_BRL_USD`.
pub fn rate_key(pair: &CurrencyPair) -> String {
    format!("exchange_rate_{}_{}", pair.from.code(), pair.to.code())
}

/// Rates keyed by currency pair on top of a shared key/value cache.
#[derive(Clone)]
pub struct RateCache {
    cache: SharedCache,
    ttl: Duration,
}

impl RateCache {
    /// Create a rate cache with the default one hour TTL.
    pub fn new(cache: SharedCache) -> Self {
        Self::with_ttl(cache, constants::rate_cache_ttl())
    }

    /// Create a rate cache with a custom TTL.
    pub fn with_ttl(cache: SharedCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a cached rate. Backend errors read as a miss.
    pub async fn get(&self, pair: &CurrencyPair) -> Option<Decimal> {
        let key = rate_key(pair);
        let rate = json::get_or_miss::<Decimal>(self.cache.as_ref(), &key).await;
        trace!(key = %key, hit = rate.is_some(), "Rate cache lookup");
        rate
    }

    /// Store a rate for the configured TTL.
    pub async fn insert(&self, pair: &CurrencyPair, rate: Decimal) {
        json::set_or_warn(self.cache.as_ref(), &rate_key(pair), &rate, self.ttl).await;
    }

    /// Drop a cached rate.
    pub async fn invalidate(&self, pair: &CurrencyPair) {
        json::delete_or_warn(self.cache.as_ref(), &rate_key(pair)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_cache::MemoryCache;
    use orderdesk_common::Currency;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn test_rate_key() {
        let pair = CurrencyPair::new(Currency::Brl, Currency::Usd);
        assert_eq!(rate_key(&pair), "exchange_rate_BRL_USD");
        assert_eq!(rate_key(&CurrencyPair::swap_from(Currency::Usd)), "exchange_rate_USD_BRL");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = RateCache::new(Arc::new(MemoryCache::new()));
        let pair = CurrencyPair::new(Currency::Usd, Currency::Brl);

        assert_eq!(cache.get(&pair).await, None);

        cache.insert(&pair, dec!(5.4321)).await;
        assert_eq!(cache.get(&pair).await, Some(dec!(5.4321)));

        cache.invalidate(&pair).await;
        assert_eq!(cache.get(&pair).await, None);
    }

    #[tokio::test]
    async fn test_expired_rate_is_a_miss() {
        let cache = RateCache::with_ttl(Arc::new(MemoryCache::new()), Duration::from_millis(20));
        let pair = CurrencyPair::new(Currency::Brl, Currency::Usd);

        cache.insert(&pair, dec!(0.2)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get(&pair).await, None);
    }
}
