//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderdesk_common::{
    now, Currency, NewOrder, NewUser, Order, OrderChanges, OrderId, Page, PageRequest, TokenId,
    User, UserChanges, UserId,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::repository::{OrderRepository, TokenRepository, UserRepository};

const ORDER_COLUMNS: &str =
    "id, user_id, description, value, currency, created_at, updated_at, deleted_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    description: String,
    value: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("orders.{}: {}", row.id, e)))?;

        Ok(Order {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            description: row.description,
            value: row.value,
            currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn find_including_deleted(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner: UserId, page: PageRequest) -> StoreResult<Page<Order>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(owner.get())
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(owner.get())
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page::new(data, page, total.max(0) as u64))
    }

    #[instrument(skip(self, order), fields(owner = %order.user_id))]
    async fn create(&self, order: NewOrder) -> StoreResult<Order> {
        let ts = now();
        let sql = format!(
            "INSERT INTO orders (user_id, description, value, currency, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.user_id.get())
            .bind(&order.description)
            .bind(order.value)
            .bind(order.currency.code())
            .bind(ts)
            .fetch_one(&self.pool)
            .await?;

        let order = Order::try_from(row)?;
        debug!(order_id = %order.id, "Order inserted");
        Ok(order)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: OrderId, changes: OrderChanges) -> StoreResult<Option<Order>> {
        let sql = format!(
            "UPDATE orders SET \
               user_id = COALESCE($2, user_id), \
               description = COALESCE($3, description), \
               value = COALESCE($4, value), \
               currency = COALESCE($5, currency), \
               updated_at = $6 \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.get())
            .bind(changes.user_id.map(|u| u.get()))
            .bind(changes.description.as_deref())
            .bind(changes.value)
            .bind(changes.currency.map(|c| c.code()))
            .bind(now())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: OrderId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .bind(now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn list(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(to_i64(page.limit()))
            .bind(to_i64(page.offset()))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            page,
            total.max(0) as u64,
        ))
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let ts = now();
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(ts)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "users.email"))?;

        Ok(row.into())
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
               name = COALESCE($2, name), \
               email = COALESCE($3, email), \
               password_hash = COALESCE($4, password_hash), \
               updated_at = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .bind(changes.name.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.password_hash.as_deref())
            .bind(now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "users.email"))?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> StoreResult<Option<Vec<OrderId>>> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent order inserts referencing this user.
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id.get())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let order_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM orders WHERE user_id = $1 ORDER BY id")
                .bind(id.get())
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(user_id = %id, orders = order_ids.len(), "User deleted");
        Ok(Some(order_ids.into_iter().map(OrderId::new).collect()))
    }

    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users \
             WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(excluding.map(|u| u.get()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }
}

#[async_trait]
impl TokenRepository for PgStore {
    async fn store(&self, user: UserId, name: &str, token_hash: &str) -> StoreResult<TokenId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO personal_access_tokens (user_id, name, token_hash, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(user.get())
        .bind(name)
        .bind(token_hash)
        .bind(now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_write(e, "personal_access_tokens.token_hash"))?;

        Ok(TokenId::new(id))
    }

    async fn resolve(&self, id: TokenId, token_hash: &str) -> StoreResult<Option<UserId>> {
        let user_id: Option<i64> = sqlx::query_scalar(
            "UPDATE personal_access_tokens SET last_used_at = $3 \
             WHERE id = $1 AND token_hash = $2 RETURNING user_id",
        )
        .bind(id.get())
        .bind(token_hash)
        .bind(now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id.map(UserId::new))
    }

    async fn revoke(&self, id: TokenId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user: UserId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE user_id = $1")
            .bind(user.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
