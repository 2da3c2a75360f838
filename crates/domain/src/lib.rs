//! Core of the storefront order engine.
//!
//! This crate provides:
//! - [`CartService`]: one cart per customer, line edits and price summaries
//! - [`InventoryAdjuster`]: floor-clamped stock increments and decrements
//! - [`derive_status`]: the aggregate order status from item statuses
//! - [`OrderLifecycle`]: cart-to-order conversion, seller item transitions,
//!   cancellation and soft deletion
//! - [`Notifier`] and [`AuditRecorder`]: best-effort collaborators
//!
//! Operations return `Result<_, ServiceError>` for exceptional conditions and
//! [`Outcome`] for expected business-rule refusals.

pub mod audit;
pub mod cart;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod order;
pub mod outcome;
pub mod pricing;

pub use audit::AuditRecorder;
pub use cart::CartService;
pub use error::ServiceError;
pub use inventory::InventoryAdjuster;
pub use notify::{
    InMemoryNotifier, LoggingNotifier, NotificationError, NotificationKind, Notifier,
    SentNotification,
};
pub use order::{OrderLifecycle, build_order, derive_status};
pub use outcome::{Outcome, Rejection, RejectionKind};
pub use pricing::{PriceSummary, PricingPolicy};
