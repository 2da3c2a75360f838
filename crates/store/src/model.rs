//! Records persisted by the stores.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{AuditId, Money, OrderId, OrderItemId, ProductId, SellerId, UserId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A catalog product with its available stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price: Money,
    /// Units available for sale. Never negative.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh ID.
    pub fn new(seller_id: SellerId, name: impl Into<String>, price: Money, quantity: u32) -> Self {
        Self {
            id: ProductId::new(),
            seller_id,
            name: name.into(),
            price,
            quantity,
            created_at: Utc::now(),
        }
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "SELLER" => Ok(Role::Seller),
            "ADMIN" => Ok(Role::Admin),
            other => Err(StoreError::Corrupt(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered user, used to address notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Creates a new user with a fresh ID.
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub seller_id: SellerId,
}

/// A customer's shopping cart. At most one per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub owner: UserId,
    /// Lines in insertion order, at most one per product.
    pub lines: Vec<CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a cart holding a single line.
    pub fn with_line(owner: UserId, line: CartLine) -> Self {
        Self {
            owner,
            lines: vec![line],
            updated_at: Utc::now(),
        }
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Returns true if the cart has a line for the product.
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fulfillment status of a single order item.
///
/// ```text
/// Pending ──► Shipped ──► Delivered
///    │
///    └──► Cancelled
/// ```
///
/// Only the transition into `Cancelled` is guarded; sellers may otherwise
/// move an item between any two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl ItemStatus {
    /// Returns true if an item in this status may be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, ItemStatus::Pending)
    }

    /// Returns true for the statuses that count as "on its way or arrived".
    pub fn is_shipped_or_delivered(&self) -> bool {
        matches!(self, ItemStatus::Shipped | ItemStatus::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Shipped => "SHIPPED",
            ItemStatus::Delivered => "DELIVERED",
            ItemStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ItemStatus::Pending),
            "SHIPPED" => Ok(ItemStatus::Shipped),
            "DELIVERED" => Ok(ItemStatus::Delivered),
            "CANCELLED" => Ok(ItemStatus::Cancelled),
            other => Err(StoreError::Corrupt(format!("unknown item status '{other}'"))),
        }
    }
}

/// Aggregate status of an order, derived from its item statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    PartiallyShipped,
    Shipped,
    PartiallyDelivered,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the customer may cancel an order in this status.
    pub fn customer_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if an administrator may cancel an order in this status.
    pub fn admin_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Shipped)
    }

    /// Returns true if the customer may soft-delete an order in this status.
    pub fn customer_can_delete(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Cancelled | OrderStatus::Delivered
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PartiallyShipped => "PARTIALLYSHIPPED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::PartiallyDelivered => "PARTIALLYDELIVERED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PARTIALLYSHIPPED" => Ok(OrderStatus::PartiallyShipped),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "PARTIALLYDELIVERED" => Ok(OrderStatus::PartiallyDelivered),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::Corrupt(format!("unknown order status '{other}'"))),
        }
    }
}

/// An item in an order: a snapshot of a cart line plus its fulfillment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    /// Product name at the time the order was placed.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the time the order was placed.
    pub unit_price: Money,
    pub seller_id: SellerId,
    pub status: ItemStatus,
}

/// An order placed from a cart.
///
/// Item snapshots never change after creation; only statuses and the
/// cancellation/deletion metadata do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: UserId,
    pub items: Vec<OrderItem>,
    /// Subtotal plus shipping and VAT, fixed at creation.
    pub total: Money,
    pub timestamp: DateTime<Utc>,
    pub status: OrderStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the status of every item, in item order.
    pub fn item_statuses(&self) -> Vec<ItemStatus> {
        self.items.iter().map(|i| i.status).collect()
    }

    /// Returns true if any item belongs to the seller.
    pub fn has_items_from(&self, seller_id: SellerId) -> bool {
        self.items.iter().any(|i| i.seller_id == seller_id)
    }
}

/// Partial update of an order's mutable fields.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_deleted: Option<bool>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn cancelled(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(OrderStatus::Cancelled),
            cancelled_at: Some(at),
            ..Self::default()
        }
    }

    pub fn soft_deleted(at: DateTime<Utc>) -> Self {
        Self {
            is_deleted: Some(true),
            deleted_at: Some(at),
            ..Self::default()
        }
    }

    /// Applies the set fields to an order.
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(at) = self.cancelled_at {
            order.cancelled_at = Some(at);
        }
        if let Some(deleted) = self.is_deleted {
            order.is_deleted = deleted;
        }
        if let Some(at) = self.deleted_at {
            order.deleted_at = Some(at);
        }
    }
}

/// Outcome recorded on an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }
}

impl FromStr for AuditStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(AuditStatus::Success),
            "FAILURE" => Ok(AuditStatus::Failure),
            other => Err(StoreError::Corrupt(format!("unknown audit status '{other}'"))),
        }
    }
}

/// A single audit history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub user_id: Option<UserId>,
    pub status: AuditStatus,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Starts a successful audit entry.
    pub fn success(
        action: impl Into<String>,
        entity: impl Into<String>,
        entity_id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditId::new(),
            action: action.into(),
            entity: entity.into(),
            entity_id: entity_id.to_string(),
            user_id: None,
            status: AuditStatus::Success,
            before_state: None,
            after_state: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Starts an audit entry for an operation that failed part way.
    pub fn failure(
        action: impl Into<String>,
        entity: impl Into<String>,
        entity_id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: AuditStatus::Failure,
            ..Self::success(action, entity, entity_id, message)
        }
    }

    pub fn by(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn before(mut self, state: serde_json::Value) -> Self {
        self.before_state = Some(state);
        self
    }

    pub fn after(mut self, state: serde_json::Value) -> Self {
        self.after_state = Some(state);
        self
    }
}
