//! Request-level services composing the store, caches and converter.

pub mod auth;
pub mod orders;
pub mod users;
pub mod validation;

pub use auth::{AuthService, AuthenticatedUser, LoginPayload, LoginResponse};
pub use orders::{OrderPayload, OrderService, OrderWithConversion};
pub use users::{UserPayload, UserService};
