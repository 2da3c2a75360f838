//! Order lifecycle: creation from a cart, seller item transitions,
//! cancellation, soft deletion and read queries.

mod builder;
mod lifecycle;
mod queries;
mod status;

pub use builder::{build_order, joined_item_names};
pub use lifecycle::OrderLifecycle;
pub use status::derive_status;
