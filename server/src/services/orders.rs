//! Order service.

use std::sync::Arc;

use orderdesk_common::{NewOrder, Order, OrderChanges, OrderId, Page, PageRequest, UserId};
use orderdesk_fx::{ConversionResult, CurrencyConverter};
use orderdesk_store::{OrderRepository, UserRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::metrics::SharedMetrics;
use crate::query_cache::{order_key, orders_page_key, QueryCache};
use crate::services::validation::{FieldValidator, MAX_STRING_LEN};

/// Create/update body. Every field is optional at this level; required-ness
/// is decided per operation.
#[derive(Debug, Default, Deserialize)]
pub struct OrderPayload {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
}

/// Order plus its conversion into the other currency.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithConversion {
    #[serde(flatten)]
    pub order: Order,
    pub converted_value: ConversionResult,
}

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    cache: QueryCache,
    converter: Arc<CurrencyConverter>,
    metrics: SharedMetrics,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        cache: QueryCache,
        converter: Arc<CurrencyConverter>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            orders,
            users,
            cache,
            converter,
            metrics,
        }
    }

    /// Orders owned by `owner`, one page at a time.
    #[instrument(skip(self), fields(owner = %owner, page = page.page))]
    pub async fn list(&self, owner: UserId, page: PageRequest) -> ApiResult<Page<Order>> {
        let key = orders_page_key(owner, page.page);
        let orders = self.orders.clone();

        let page = self
            .cache
            .remember(&key, || async move {
                orders.list_for_owner(owner, page).await.map(Some)
            })
            .await?;

        page.ok_or_else(|| ApiError::Internal("order page missing after load".to_string()))
    }

    /// Create an order owned by `owner`.
    #[instrument(skip(self, payload), fields(owner = %owner))]
    pub async fn create(&self, owner: UserId, payload: OrderPayload) -> ApiResult<Order> {
        let mut v = FieldValidator::new();

        let description = v.string(
            "description",
            "descrição",
            payload.description.as_ref(),
            true,
            MAX_STRING_LEN,
        );
        let value = v.amount("value", "valor", payload.value.as_ref(), true);
        let currency = v.currency("currency", payload.currency.as_ref(), true);
        let user_id = v.user_id("user_id", payload.user_id.as_ref(), false);
        self.check_user_exists(&mut v, user_id).await?;
        v.finish()?;

        let (Some(description), Some(value), Some(currency)) = (description, value, currency) else {
            return Err(ApiError::Internal("validated order fields missing".to_string()));
        };

        let order = self
            .orders
            .create(NewOrder {
                user_id: owner,
                description,
                value,
                currency,
            })
            .await?;

        self.metrics.order_created();
        info!(order_id = %order.id, value = %order.value, currency = %order.currency, "Order created");

        Ok(order)
    }

    /// Fetch a live order and convert its value.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn show(&self, id: OrderId) -> ApiResult<OrderWithConversion> {
        let orders = self.orders.clone();
        let order = self
            .cache
            .remember(&order_key(id), || async move { orders.find(id).await })
            .await?
            .ok_or(ApiError::OrderNotFound)?;

        let converted_value = self.converter.convert(order.value, order.currency).await;
        self.metrics.order_shown(converted_value.is_degraded());

        Ok(OrderWithConversion {
            order,
            converted_value,
        })
    }

    /// Apply the supplied fields to a live order.
    #[instrument(skip(self, payload), fields(order_id = %id))]
    pub async fn update(&self, id: OrderId, payload: OrderPayload) -> ApiResult<Order> {
        let mut v = FieldValidator::new();

        let changes = OrderChanges {
            description: v.string(
                "description",
                "descrição",
                payload.description.as_ref(),
                false,
                MAX_STRING_LEN,
            ),
            value: v.amount("value", "valor", payload.value.as_ref(), false),
            currency: v.currency("currency", payload.currency.as_ref(), false),
            user_id: v.user_id("user_id", payload.user_id.as_ref(), false),
        };
        self.check_user_exists(&mut v, changes.user_id).await?;
        v.finish()?;

        let order = if changes.is_empty() {
            self.orders.find(id).await?
        } else {
            self.orders.update(id, changes).await?
        };
        let order = order.ok_or(ApiError::OrderNotFound)?;

        self.cache.forget(&order_key(id)).await;
        self.metrics.order_updated();
        info!("Order updated");

        Ok(order)
    }

    /// Soft-delete a live order.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: OrderId) -> ApiResult<()> {
        if !self.orders.soft_delete(id).await? {
            return Err(ApiError::OrderNotFound);
        }

        self.cache.forget(&order_key(id)).await;
        self.metrics.order_deleted();
        info!("Order deleted");

        Ok(())
    }

    async fn check_user_exists(
        &self,
        v: &mut FieldValidator,
        user_id: Option<UserId>,
    ) -> ApiResult<()> {
        if let Some(user_id) = user_id {
            if self.users.find(user_id).await?.is_none() {
                v.error("user_id", "O usuário informado não existe.");
            }
        }
        Ok(())
    }
}
