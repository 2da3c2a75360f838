//! Shared types for the storefront order engine.
//!
//! Identifier newtypes keep customer, seller, product and order IDs from
//! being mixed up; [`Money`] holds every price as integer cents.

mod money;
mod types;

pub use money::Money;
pub use types::{AuditId, OrderId, OrderItemId, ProductId, SellerId, UserId};
