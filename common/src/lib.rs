//! OrderDesk Common Types
//!
//! This crate contains shared types used across OrderDesk, including
//! identifiers, monetary types, order and user records, and pagination.

pub mod identifiers;
pub mod monetary;
pub mod order;
pub mod user;
pub mod pagination;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use order::*;
pub use user::*;
pub use pagination::*;
pub use error::*;
pub use time::*;
