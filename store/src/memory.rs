//! In-memory store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use orderdesk_common::{
    now, NewOrder, NewUser, Order, OrderChanges, OrderId, Page, PageRequest, Timestamp, TokenId,
    User, UserChanges, UserId,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::{OrderRepository, TokenRepository, UserRepository};

#[derive(Debug, Clone)]
struct TokenRow {
    user_id: UserId,
    #[allow(dead_code)]
    name: String,
    token_hash: String,
    last_used_at: Option<Timestamp>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    tokens: BTreeMap<TokenId, TokenRow>,
    next_user: i64,
    next_order: i64,
    next_token: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, excluding: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != excluding)
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let data = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    Page::new(data, page, total)
}

/// Process-local tables behind a single lock.
///
/// Ids start at 1 and are never reused. Deleting a user cascades to their
/// orders and tokens.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders, including soft-deleted ones.
    pub fn order_count(&self) -> usize {
        self.tables.read().orders.len()
    }

    /// Number of live tokens.
    pub fn token_count(&self) -> usize {
        self.tables.read().tokens.len()
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let tables = self.tables.read();
        Ok(tables.orders.get(&id).filter(|o| !o.is_deleted()).cloned())
    }

    async fn find_including_deleted(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables.read().orders.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: UserId, page: PageRequest) -> StoreResult<Page<Order>> {
        let tables = self.tables.read();
        let rows: Vec<&Order> = tables
            .orders
            .values()
            .filter(|o| !o.is_deleted() && o.is_owned_by(owner))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn create(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tables = self.tables.write();
        tables.next_order += 1;
        let ts = now();
        let order = Order {
            id: OrderId::new(tables.next_order),
            user_id: order.user_id,
            description: order.description,
            value: order.value,
            currency: order.currency,
            created_at: ts,
            updated_at: ts,
            deleted_at: None,
        };
        tables.orders.insert(order.id, order.clone());

        debug!(order_id = %order.id, "Order inserted");
        Ok(order)
    }

    async fn update(&self, id: OrderId, changes: OrderChanges) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write();
        match tables.orders.get_mut(&id).filter(|o| !o.is_deleted()) {
            Some(order) => {
                changes.apply(order, now());
                Ok(Some(order.clone()))
            }
            None => Ok(None),
        }
    }

    async fn soft_delete(&self, id: OrderId) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.orders.get_mut(&id).filter(|o| !o.is_deleted()) {
            Some(order) => {
                order.deleted_at = Some(now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let tables = self.tables.read();
        Ok(paginate(tables.users.values().collect(), page))
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write();
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("users.email".to_string()));
        }

        tables.next_user += 1;
        let ts = now();
        let user = User {
            id: UserId::new(tables.next_user),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: ts,
            updated_at: ts,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write();
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict("users.email".to_string()));
            }
        }

        match tables.users.get_mut(&id) {
            Some(user) => {
                changes.apply(user, now());
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: UserId) -> StoreResult<Option<Vec<OrderId>>> {
        let mut tables = self.tables.write();
        if tables.users.remove(&id).is_none() {
            return Ok(None);
        }

        let mut removed = Vec::new();
        tables.orders.retain(|order_id, o| {
            let keep = o.user_id != id;
            if !keep {
                removed.push(*order_id);
            }
            keep
        });
        tables.tokens.retain(|_, t| t.user_id != id);
        Ok(Some(removed))
    }

    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> StoreResult<bool> {
        Ok(self.tables.read().email_taken(email, excluding))
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn store(&self, user: UserId, name: &str, token_hash: &str) -> StoreResult<TokenId> {
        let mut tables = self.tables.write();
        tables.next_token += 1;
        let id = TokenId::new(tables.next_token);
        tables.tokens.insert(
            id,
            TokenRow {
                user_id: user,
                name: name.to_string(),
                token_hash: token_hash.to_string(),
                last_used_at: None,
            },
        );
        Ok(id)
    }

    async fn resolve(&self, id: TokenId, token_hash: &str) -> StoreResult<Option<UserId>> {
        let mut tables = self.tables.write();
        match tables.tokens.get_mut(&id) {
            Some(row) if row.token_hash == token_hash => {
                row.last_used_at = Some(now());
                Ok(Some(row.user_id))
            }
            _ => Ok(None),
        }
    }

    async fn revoke(&self, id: TokenId) -> StoreResult<bool> {
        Ok(self.tables.write().tokens.remove(&id).is_some())
    }

    async fn revoke_all_for_user(&self, user: UserId) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let before = tables.tokens.len();
        tables.tokens.retain(|_, t| t.user_id != user);
        Ok((before - tables.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use orderdesk_common::Currency;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Maria".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_order(owner: UserId, description: &str) -> NewOrder {
        NewOrder {
            user_id: owner,
            description: description.to_string(),
            value: dec!(150.50),
            currency: Currency::Brl,
        }
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let repos = Repositories::in_memory();
        let alice = repos.users.create(new_user("alice@example.com")).await.unwrap();
        let bob = repos.users.create(new_user("bob@example.com")).await.unwrap();

        for i in 0..3 {
            repos.orders.create(new_order(alice.id, &format!("a{i}"))).await.unwrap();
        }
        repos.orders.create(new_order(bob.id, "b0")).await.unwrap();

        let page = repos
            .orders
            .list_for_owner(alice.id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert!(page.data.iter().all(|o| o.user_id == alice.id));
    }

    #[tokio::test]
    async fn test_pagination() {
        let repos = Repositories::in_memory();
        let owner = repos.users.create(new_user("p@example.com")).await.unwrap();
        for i in 0..23 {
            repos.orders.create(new_order(owner.id, &format!("o{i}"))).await.unwrap();
        }

        let page = repos
            .orders
            .list_for_owner(owner.id, PageRequest::new(3, 10))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 3);
        assert_eq!(page.total, 23);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.data[0].description, "o20");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_row() {
        let repos = Repositories::in_memory();
        let owner = repos.users.create(new_user("d@example.com")).await.unwrap();
        let order = repos.orders.create(new_order(owner.id, "gone")).await.unwrap();

        assert!(repos.orders.soft_delete(order.id).await.unwrap());
        assert!(!repos.orders.soft_delete(order.id).await.unwrap());

        assert!(repos.orders.find(order.id).await.unwrap().is_none());
        assert!(repos
            .orders
            .update(order.id, OrderChanges::default())
            .await
            .unwrap()
            .is_none());

        let row = repos
            .orders
            .find_including_deleted(order.id)
            .await
            .unwrap()
            .unwrap();
        assert!(row.deleted_at.is_some());

        let page = repos
            .orders
            .list_for_owner(owner.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repos = Repositories::in_memory();
        let first = repos.users.create(new_user("dup@example.com")).await.unwrap();

        let result = repos.users.create(new_user("DUP@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        assert!(repos.users.email_taken("dup@example.com", None).await.unwrap());
        assert!(!repos
            .users
            .email_taken("dup@example.com", Some(first.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories {
            orders: store.clone(),
            users: store.clone(),
            tokens: store.clone(),
        };
        let user = repos.users.create(new_user("c@example.com")).await.unwrap();
        let other = repos.users.create(new_user("d@example.com")).await.unwrap();
        let live = repos.orders.create(new_order(user.id, "x")).await.unwrap();
        let trashed = repos.orders.create(new_order(user.id, "y")).await.unwrap();
        repos.orders.soft_delete(trashed.id).await.unwrap();
        repos.orders.create(new_order(other.id, "z")).await.unwrap();
        repos.tokens.store(user.id, "api", "digest").await.unwrap();

        let removed = repos.users.delete(user.id).await.unwrap();

        assert_eq!(removed, Some(vec![live.id, trashed.id]));
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.token_count(), 0);
        assert_eq!(repos.users.delete(user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_resolve_requires_matching_hash() {
        let repos = Repositories::in_memory();
        let user = repos.users.create(new_user("t@example.com")).await.unwrap();
        let id = repos.tokens.store(user.id, "api", "right").await.unwrap();

        assert_eq!(repos.tokens.resolve(id, "right").await.unwrap(), Some(user.id));
        assert_eq!(repos.tokens.resolve(id, "wrong").await.unwrap(), None);

        assert!(repos.tokens.revoke(id).await.unwrap());
        assert_eq!(repos.tokens.resolve(id, "right").await.unwrap(), None);
    }
}
