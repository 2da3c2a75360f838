//! Aggregate order status reconciliation.

use store::{ItemStatus, OrderStatus};

/// Derives the aggregate order status from its item statuses.
///
/// First matching rule wins:
///
/// | rule | result |
/// |------|--------|
/// | every item delivered | `Delivered` |
/// | every item cancelled | `Cancelled` |
/// | any item delivered | `PartiallyDelivered` |
/// | any shipped, not all shipped or delivered | `PartiallyShipped` |
/// | every item shipped or delivered | `Shipped` |
/// | otherwise | `Pending` |
///
/// An order with no items is `Pending`.
pub fn derive_status(statuses: &[ItemStatus]) -> OrderStatus {
    if statuses.is_empty() {
        return OrderStatus::Pending;
    }

    let all = |pred: fn(&ItemStatus) -> bool| statuses.iter().all(pred);
    let any = |s: ItemStatus| statuses.contains(&s);

    if all(|s| *s == ItemStatus::Delivered) {
        OrderStatus::Delivered
    } else if all(|s| *s == ItemStatus::Cancelled) {
        OrderStatus::Cancelled
    } else if any(ItemStatus::Delivered) {
        OrderStatus::PartiallyDelivered
    } else if any(ItemStatus::Shipped) && !all(ItemStatus::is_shipped_or_delivered) {
        OrderStatus::PartiallyShipped
    } else if all(ItemStatus::is_shipped_or_delivered) {
        OrderStatus::Shipped
    } else {
        OrderStatus::Pending
    }
}
