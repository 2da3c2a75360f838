use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderItemId, ProductId, SellerId, UserId};
use tokio::sync::RwLock;

use crate::{
    AuditEntry, Cart, CartLine, ItemStatus, Order, OrderPatch, Product, Result, User,
    store::{AuditStore, CartStore, OrderStore, ProductStore, UserStore},
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    users: HashMap<UserId, User>,
    audit: Vec<AuditEntry>,
}

/// In-memory store implementation for testing and local runs.
///
/// This implementation keeps every record in memory and provides
/// the same interface as the PostgreSQL implementation. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored, including soft-deleted ones.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of audit entries stored.
    pub async fn audit_count(&self) -> usize {
        self.state.read().await.audit.len()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    orders
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
        Ok(())
    }

    async fn decrease_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>> {
        let mut state = self.state.write().await;
        Ok(state.products.get_mut(&id).map(|p| {
            p.quantity = p.quantity.saturating_sub(amount);
            p.quantity
        }))
    }

    async fn increase_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>> {
        let mut state = self.state.write().await;
        Ok(state.products.get_mut(&id).map(|p| {
            p.quantity = p.quantity.saturating_add(amount);
            p.quantity
        }))
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_cart(&self, owner: UserId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&owner).cloned())
    }

    async fn create_cart(&self, cart: Cart) -> Result<()> {
        self.state.write().await.carts.insert(cart.owner, cart);
        Ok(())
    }

    async fn replace_cart_lines(&self, owner: UserId, lines: Vec<CartLine>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.carts.get_mut(&owner) {
            Some(cart) => {
                cart.lines = lines;
                cart.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cart(&self, owner: UserId) -> Result<bool> {
        Ok(self.state.write().await.carts.remove(&owner).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id && !o.is_deleted)
            .cloned())
    }

    async fn find_order_with_deleted(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_by_owner(&self, owner: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let orders = state
            .orders
            .iter()
            .filter(|o| o.owner == owner && !o.is_deleted)
            .cloned()
            .collect();
        Ok(newest_first(orders))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let orders = state
            .orders
            .iter()
            .filter(|o| !o.is_deleted)
            .cloned()
            .collect();
        Ok(newest_first(orders))
    }

    async fn insert_order(&self, order: Order) -> Result<()> {
        self.state.write().await.orders.push(order);
        Ok(())
    }

    async fn update_order_fields(&self, id: OrderId, patch: OrderPatch) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                patch.apply_to(order);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_item_status(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        seller_id: SellerId,
        status: ItemStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let item = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .and_then(|o| {
                o.items
                    .iter_mut()
                    .find(|i| i.id == item_id && i.seller_id == seller_id)
            });
        match item {
            Some(item) => {
                item.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<()> {
        self.state.write().await.users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        self.state.write().await.audit.push(entry);
        Ok(())
    }

    async fn list_audit_for_entity(&self, entity_id: &str) -> Result<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn list_recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(state.audit.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderItem, OrderStatus};
    use common::Money;

    fn create_test_order(owner: UserId, seller_id: SellerId) -> Order {
        Order {
            id: OrderId::new(),
            owner,
            items: vec![OrderItem {
                id: OrderItemId::new(),
                product_id: ProductId::new(),
                product_name: "Widget".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(500),
                seller_id,
                status: ItemStatus::Pending,
            }],
            total: Money::from_cents(2130),
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
            cancelled_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn decrease_floors_at_zero() {
        let store = InMemoryStore::new();
        let product = Product::new(SellerId::new(), "Widget", Money::from_cents(500), 3);
        let id = product.id;
        store.insert_product(product).await.unwrap();

        assert_eq!(store.decrease_quantity(id, 2).await.unwrap(), Some(1));
        assert_eq!(store.decrease_quantity(id, 5).await.unwrap(), Some(0));
        assert_eq!(store.increase_quantity(id, 4).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn increase_saturates_at_max() {
        let store = InMemoryStore::new();
        let product = Product::new(SellerId::new(), "Widget", Money::from_cents(500), u32::MAX - 1);
        let id = product.id;
        store.insert_product(product).await.unwrap();

        assert_eq!(store.increase_quantity(id, 10).await.unwrap(), Some(u32::MAX));
    }

    #[tokio::test]
    async fn adjusting_missing_product_returns_none() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.decrease_quantity(ProductId::new(), 1).await.unwrap(),
            None
        );
        assert_eq!(
            store.increase_quantity(ProductId::new(), 1).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn cart_lifecycle() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let line = CartLine {
            product_id: ProductId::new(),
            quantity: 1,
            seller_id: SellerId::new(),
        };

        assert!(!store.replace_cart_lines(owner, vec![]).await.unwrap());

        store
            .create_cart(Cart::with_line(owner, line.clone()))
            .await
            .unwrap();
        assert!(store.replace_cart_lines(owner, vec![]).await.unwrap());
        assert!(store.find_cart(owner).await.unwrap().unwrap().is_empty());

        assert!(store.delete_cart(owner).await.unwrap());
        assert!(!store.delete_cart(owner).await.unwrap());
        assert!(store.find_cart(owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_deleted_orders_hidden_from_default_reads() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let order = create_test_order(owner, SellerId::new());
        let id = order.id;
        store.insert_order(order).await.unwrap();

        store
            .update_order_fields(id, OrderPatch::soft_deleted(Utc::now()))
            .await
            .unwrap();

        assert!(store.find_order(id).await.unwrap().is_none());
        assert!(store.list_orders_by_owner(owner).await.unwrap().is_empty());
        assert!(store.list_orders().await.unwrap().is_empty());
        assert!(store.find_order_with_deleted(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn item_status_update_requires_matching_seller() {
        let store = InMemoryStore::new();
        let seller = SellerId::new();
        let order = create_test_order(UserId::new(), seller);
        let order_id = order.id;
        let item_id = order.items[0].id;
        store.insert_order(order).await.unwrap();

        let updated = store
            .update_item_status(order_id, item_id, SellerId::new(), ItemStatus::Shipped)
            .await
            .unwrap();
        assert!(!updated);

        let updated = store
            .update_item_status(order_id, item_id, seller, ItemStatus::Shipped)
            .await
            .unwrap();
        assert!(updated);

        let order = store.find_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.items[0].status, ItemStatus::Shipped);
    }

    #[tokio::test]
    async fn audit_lists_newest_first() {
        let store = InMemoryStore::new();
        store
            .append_audit(AuditEntry::success("CREATE", "Order", "a", "first"))
            .await
            .unwrap();
        store
            .append_audit(AuditEntry::success("UPDATE", "Order", "a", "second"))
            .await
            .unwrap();
        store
            .append_audit(AuditEntry::success("CREATE", "Order", "b", "third"))
            .await
            .unwrap();

        let for_a = store.list_audit_for_entity("a").await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].message, "second");

        let recent = store.list_recent_audit(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "third");
    }
}
