//! Order records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, OrderId, UserId};

/// A persisted order.
///
/// `value` serializes as a decimal string with two places (`"150.50"`), the
/// same shape a NUMERIC(10,2) column produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub description: String,
    pub value: Decimal,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the order has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `user` owns this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}

/// Fields required to create an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub description: String,
    pub value: Decimal,
    pub currency: Currency,
}

/// Partial update of an order. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub user_id: Option<UserId>,
    pub description: Option<String>,
    pub value: Option<Decimal>,
    pub currency: Option<Currency>,
}

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.description.is_none()
            && self.value.is_none()
            && self.currency.is_none()
    }

    /// Apply the supplied fields to `order`, bumping `updated_at`.
    pub fn apply(&self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(user_id) = self.user_id {
            order.user_id = user_id;
        }
        if let Some(description) = &self.description {
            order.description = description.clone();
        }
        if let Some(value) = self.value {
            order.value = value;
        }
        if let Some(currency) = self.currency {
            order.currency = currency;
        }
        order.updated_at = now;
    }
}
