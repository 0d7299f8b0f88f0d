//! Exchange rate clients.

use std::time::Duration;

use async_trait::async_trait;
use orderdesk_common::{constants, CurrencyPair};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};

/// Source of exchange rates.
#[async_trait]
pub trait RateClient: Send + Sync {
    /// Get the client name.
    fn name(&self) -> &str;

    /// Fetch how many units of `pair.to` one unit of `pair.from` buys.
    async fn fetch_rate(&self, pair: &CurrencyPair) -> FxResult<Decimal>;
}

/// Largest rate accepted from upstream. BRL/USD sits near 5 either way.
pub const MAX_RATE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Accept a rate only if it is positive and no larger than [`MAX_RATE`].
pub fn check_rate(pair: &CurrencyPair, rate: Decimal) -> FxResult<Decimal> {
    if rate > Decimal::ZERO && rate <= MAX_RATE {
        Ok(rate)
    } else {
        Err(FxError::InvalidRate {
            pair: *pair,
            rate: rate.to_string(),
        })
    }
}

/// Default ExchangeRate-API base URL.
pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Configuration for [`ExchangeRateApiClient`].
#[derive(Debug, Clone)]
pub struct ExchangeRateApiConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// API key; requests are not attempted without one.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ExchangeRateApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: constants::exchange_rate_timeout(),
        }
    }
}

impl ExchangeRateApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("EXCHANGE_RATE_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(url) = std::env::var("EXCHANGE_RATE_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(secs) = std::env::var("EXCHANGE_RATE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        config
    }
}

/// `GET {base}/{key}/pair/{from}/{to}` response body.
#[derive(Debug, Deserialize)]
struct PairResponse {
    conversion_rate: Option<f64>,
}

/// Client for the ExchangeRate-API pair endpoint.
pub struct ExchangeRateApiClient {
    http: reqwest::Client,
    config: ExchangeRateApiConfig,
}

impl ExchangeRateApiClient {
    /// Create a client with the configured timeout.
    pub fn new(config: ExchangeRateApiConfig) -> FxResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FxError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn pair_url(&self, api_key: &str, pair: &CurrencyPair) -> String {
        format!(
            "{}/{}/pair/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            api_key,
            pair.from.code(),
            pair.to.code()
        )
    }
}

#[async_trait]
impl RateClient for ExchangeRateApiClient {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    #[instrument(skip(self), fields(pair = %pair))]
    async fn fetch_rate(&self, pair: &CurrencyPair) -> FxResult<Decimal> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(FxError::MissingCredential)?;

        let response = self.http.get(self.pair_url(api_key, pair)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::UpstreamStatus(status.as_u16()));
        }

        let body: PairResponse = response
            .json()
            .await
            .map_err(|_| FxError::RateNotAvailable(*pair))?;

        let raw = body.conversion_rate.ok_or(FxError::RateNotAvailable(*pair))?;
        let rate = Decimal::from_f64(raw).ok_or_else(|| FxError::InvalidRate {
            pair: *pair,
            rate: raw.to_string(),
        })?;
        let rate = check_rate(pair, rate)?;

        debug!(rate = %rate, "Fetched exchange rate");
        Ok(rate)
    }
}

/// Mock rate client for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateClient {
    rates: dashmap::DashMap<CurrencyPair, Decimal>,
    failing: std::sync::atomic::AtomicBool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateClient {
    /// Create a mock with no rates.
    pub fn new() -> Self {
        Self {
            rates: dashmap::DashMap::new(),
            failing: std::sync::atomic::AtomicBool::new(false),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set a rate for a currency pair.
    pub fn set_rate(&self, pair: CurrencyPair, rate: Decimal) {
        self.rates.insert(pair, rate);
    }

    /// Builder form of [`set_rate`](Self::set_rate).
    pub fn with_rate(self, pair: CurrencyPair, rate: Decimal) -> Self {
        self.set_rate(pair, rate);
        self
    }

    /// Make every call fail as if the API returned 500.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockRateClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateClient for MockRateClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_rate(&self, pair: &CurrencyPair) -> FxResult<Decimal> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::UpstreamStatus(500));
        }

        self.rates
            .get(pair)
            .map(|r| *r)
            .ok_or(FxError::RateNotAvailable(*pair))
    }
}
