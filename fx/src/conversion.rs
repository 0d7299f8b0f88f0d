//! Conversion result attached to an order.

use orderdesk_common::{round_half_up, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of converting an order value into its counterpart currency.
///
/// Amounts serialize as JSON numbers. When the rate could not be obtained
/// the result is an identity conversion and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub from_currency: Currency,
    pub to_currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub converted_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate_used: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    /// Successful conversion: `amount * rate`, rounded half-up to the target
    /// currency's precision. `None` when the product overflows.
    pub fn converted(amount: Decimal, from: Currency, rate: Decimal) -> Option<Self> {
        let to = from.counterpart();
        let product = amount.checked_mul(rate)?;
        Some(Self {
            from_currency: from,
            to_currency: to,
            original_amount: amount,
            converted_amount: round_half_up(product, to.decimal_places()),
            rate_used: rate,
            error: None,
        })
    }

    /// Identity conversion used when no rate is available.
    pub fn degraded(amount: Decimal, from: Currency, reason: impl Into<String>) -> Self {
        Self {
            from_currency: from,
            to_currency: from.counterpart(),
            original_amount: amount,
            converted_amount: amount,
            rate_used: Decimal::ONE,
            error: Some(reason.into()),
        }
    }

    /// Whether this result fell back to the identity conversion.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
