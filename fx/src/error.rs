//! FX error types.

use orderdesk_common::CurrencyPair;
use thiserror::Error;

/// Errors that can occur fetching an exchange rate.
///
/// None of these reach API clients: the converter absorbs them into a
/// degraded [`ConversionResult`](crate::ConversionResult).
#[derive(Debug, Error)]
pub enum FxError {
    /// No API key configured for the pricing API.
    #[error("Exchange rate API key is not configured")]
    MissingCredential,

    /// The request did not complete in time.
    #[error("Exchange rate request timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("Exchange rate request failed: {0}")]
    Transport(String),

    /// The pricing API answered with a non-success status.
    #[error("Exchange rate API returned status {0}")]
    UpstreamStatus(u16),

    /// The response body had no usable rate.
    #[error("Rate not available for {0}")]
    RateNotAvailable(CurrencyPair),

    /// The rate could not be represented or was not positive.
    #[error("Invalid rate {rate} for {pair}")]
    InvalidRate { pair: CurrencyPair, rate: String },
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FxError::Timeout
        } else if let Some(status) = err.status() {
            FxError::UpstreamStatus(status.as_u16())
        } else {
            FxError::Transport(err.to_string())
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
