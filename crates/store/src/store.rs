use async_trait::async_trait;
use common::{OrderId, OrderItemId, ProductId, SellerId, UserId};

use crate::{
    AuditEntry, Cart, CartLine, ItemStatus, Order, OrderPatch, Product, Result, User,
};

/// Product lookup and stock updates.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Retrieves a product. Returns None if it doesn't exist.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Stores a new product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Subtracts `amount` from the product's stock in one atomic update,
    /// flooring at zero.
    ///
    /// Returns the new stock, or None if the product doesn't exist.
    async fn decrease_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>>;

    /// Adds `amount` to the product's stock in one atomic update.
    ///
    /// Returns the new stock, or None if the product doesn't exist.
    async fn increase_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>>;
}

/// One cart per owner.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Retrieves the owner's cart. Returns None if they have none.
    async fn find_cart(&self, owner: UserId) -> Result<Option<Cart>>;

    /// Stores a new cart. An existing cart for the same owner is replaced.
    async fn create_cart(&self, cart: Cart) -> Result<()>;

    /// Replaces the lines of the owner's cart.
    ///
    /// Returns false if the owner has no cart.
    async fn replace_cart_lines(&self, owner: UserId, lines: Vec<CartLine>) -> Result<bool>;

    /// Deletes the owner's cart. Returns true if one existed.
    async fn delete_cart(&self, owner: UserId) -> Result<bool>;
}

/// Orders and their items.
///
/// Every read except [`OrderStore::find_order_with_deleted`] hides
/// soft-deleted orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Retrieves a live order.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves an order whether or not it has been soft-deleted.
    async fn find_order_with_deleted(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists an owner's live orders, newest first.
    async fn list_orders_by_owner(&self, owner: UserId) -> Result<Vec<Order>>;

    /// Lists every live order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Stores a new order.
    async fn insert_order(&self, order: Order) -> Result<()>;

    /// Applies a partial update. Returns false if the order doesn't exist.
    async fn update_order_fields(&self, id: OrderId, patch: OrderPatch) -> Result<bool>;

    /// Sets the status of the item matching both `item_id` and `seller_id`.
    ///
    /// Returns false if no such item exists on the order.
    async fn update_item_status(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        seller_id: SellerId,
        status: ItemStatus,
    ) -> Result<bool>;
}

/// User lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    async fn insert_user(&self, user: User) -> Result<()>;
}

/// Append-only audit history.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, entry: AuditEntry) -> Result<()>;

    /// Lists entries for one entity, newest first.
    async fn list_audit_for_entity(&self, entity_id: &str) -> Result<Vec<AuditEntry>>;

    /// Lists the most recent entries, newest first.
    async fn list_recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>>;
}

/// Every store the core needs, behind one cloneable handle.
pub trait Storage:
    ProductStore + CartStore + OrderStore + UserStore + AuditStore + Clone + 'static
{
}

// Blanket implementation for any backend providing every store
impl<T> Storage for T where
    T: ProductStore + CartStore + OrderStore + UserStore + AuditStore + Clone + 'static
{
}
