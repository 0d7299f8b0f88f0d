//! Repository traits.

use async_trait::async_trait;
use orderdesk_common::{
    NewOrder, NewUser, Order, OrderChanges, OrderId, Page, PageRequest, TokenId, User,
    UserChanges, UserId,
};

use crate::error::StoreResult;

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Live order by id.
    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Order by id, soft-deleted or not.
    async fn find_including_deleted(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Live orders owned by `owner`, ordered by id.
    async fn list_for_owner(&self, owner: UserId, page: PageRequest) -> StoreResult<Page<Order>>;

    async fn create(&self, order: NewOrder) -> StoreResult<Order>;

    /// Apply `changes` to a live order. `None` if it does not exist.
    async fn update(&self, id: OrderId, changes: OrderChanges) -> StoreResult<Option<Order>>;

    /// Set `deleted_at` on a live order. Returns false if there was none.
    async fn soft_delete(&self, id: OrderId) -> StoreResult<bool>;
}

/// User persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Lookup by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list(&self, page: PageRequest) -> StoreResult<Page<User>>;

    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) if the
    /// email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Remove the user together with their orders and tokens. Returns the
    /// ids of the removed orders, soft-deleted ones included, or `None` if
    /// there was no such user.
    async fn delete(&self, id: UserId) -> StoreResult<Option<Vec<OrderId>>>;

    /// Whether another user already has `email`.
    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> StoreResult<bool>;
}

/// Bearer token persistence. Only token digests are stored.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a token digest and return the new token id.
    async fn store(&self, user: UserId, name: &str, token_hash: &str) -> StoreResult<TokenId>;

    /// Owner of token `id` if `token_hash` matches. Touches `last_used_at`.
    async fn resolve(&self, id: TokenId, token_hash: &str) -> StoreResult<Option<UserId>>;

    async fn revoke(&self, id: TokenId) -> StoreResult<bool>;

    async fn revoke_all_for_user(&self, user: UserId) -> StoreResult<u64>;
}
