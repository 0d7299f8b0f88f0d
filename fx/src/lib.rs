//! OrderDesk FX
//!
//! Best-effort currency conversion between BRL and USD.
//!
//! # Features
//!
//! - Exchange rates fetched from a remote pricing API
//! - Cache-aside rate lookup with a one hour TTL
//! - Graceful degradation: upstream failures produce an identity conversion
//!   flagged with an `error` marker instead of an error
//!
//! # Example
//!
//! ```rust,ignore
//! use orderdesk_fx::{CurrencyConverter, ExchangeRateApiClient, ExchangeRateApiConfig};
//!
//! let client = Arc::new(ExchangeRateApiClient::new(ExchangeRateApiConfig::from_env())?);
//! let converter = CurrencyConverter::new(client, cache, ConverterConfig::default());
//!
//! let result = converter.convert(dec!(150.50), Currency::Brl).await;
//! assert_eq!(result.to_currency, Currency::Usd);
//! ```

pub mod cache;
pub mod conversion;
pub mod converter;
pub mod error;
pub mod provider;

pub use cache::RateCache;
pub use conversion::ConversionResult;
pub use converter::{ConverterConfig, ConverterStats, ConverterStatsSnapshot, CurrencyConverter};
pub use error::{FxError, FxResult};
pub use provider::{ExchangeRateApiClient, ExchangeRateApiConfig, RateClient};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateClient;
