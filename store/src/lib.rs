//! OrderDesk Store
//!
//! Persistence for orders, users and access tokens.
//!
//! Each entity has a repository trait with two implementations:
//!
//! - [`MemoryStore`]: process-local tables, used in tests and when no
//!   database is configured
//! - [`PgStore`]: PostgreSQL through `sqlx`, with embedded migrations
//!
//! Orders are soft-deleted; every read except
//! [`OrderRepository::find_including_deleted`] skips deleted rows.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{OrderRepository, TokenRepository, UserRepository};

/// Handles to every repository, sharing one backend.
#[derive(Clone)]
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    /// Repositories over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    /// Repositories over a PostgreSQL pool.
    pub fn postgres(store: PgStore) -> Self {
        Self::from_backend(Arc::new(store))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: OrderRepository + UserRepository + TokenRepository + 'static,
    {
        Self {
            orders: backend.clone(),
            users: backend.clone(),
            tokens: backend,
        }
    }
}
