//! Persistence layer for the storefront order engine.
//!
//! Defines the records the core reads and writes, the narrow store traits
//! the core depends on, and two backends: [`InMemoryStore`] for tests and
//! local runs, and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    AuditEntry, AuditStatus, Cart, CartLine, ItemStatus, Order, OrderItem, OrderPatch,
    OrderStatus, Product, Role, User,
};
pub use postgres::PostgresStore;
pub use store::{AuditStore, CartStore, OrderStore, ProductStore, Storage, UserStore};
