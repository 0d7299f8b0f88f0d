//! Monetary types for OrderDesk.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currencies an order can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "BRL")]
    Brl,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Currency; 2] = [Currency::Brl, Currency::Usd];

    /// Get the ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
        }
    }

    /// The other supported currency; conversions always go BRL <-> USD.
    pub fn counterpart(&self) -> Currency {
        match self {
            Currency::Brl => Currency::Usd,
            Currency::Usd => Currency::Brl,
        }
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error when parsing an unsupported currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            other => Err(UnsupportedCurrency(other.to_string())),
        }
    }
}

/// An ordered currency pair (from -> to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: Currency,
    pub to: Currency,
}

impl CurrencyPair {
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Pair converting `from` into its counterpart.
    pub fn swap_from(from: Currency) -> Self {
        Self::new(from, from.counterpart())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
