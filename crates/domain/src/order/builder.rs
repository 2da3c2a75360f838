//! Cart-to-order conversion.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, UserId};
use store::{CartLine, ItemStatus, Order, OrderItem, OrderStatus, Product};

/// Builds a pending order from resolved cart lines.
///
/// Each item snapshots the product name and price at the time of the call.
/// `total` is the summary total, including shipping and VAT.
pub fn build_order(
    owner: UserId,
    lines: &[(CartLine, Product)],
    total: Money,
    timestamp: DateTime<Utc>,
) -> Order {
    let items = lines
        .iter()
        .map(|(line, product)| OrderItem {
            id: OrderItemId::new(),
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            seller_id: line.seller_id,
            status: ItemStatus::Pending,
        })
        .collect();

    Order {
        id: OrderId::new(),
        owner,
        items,
        total,
        timestamp,
        status: OrderStatus::Pending,
        cancelled_at: None,
        is_deleted: false,
        deleted_at: None,
    }
}

/// Joins item names with `", "` for the confirmation message.
pub fn joined_item_names(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|i| i.product_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
