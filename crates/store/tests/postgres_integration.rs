//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId, OrderItemId, ProductId, SellerId, UserId};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    AuditEntry, AuditStore, Cart, CartLine, CartStore, ItemStatus, Order, OrderItem, OrderPatch,
    OrderStatus, OrderStore, PostgresStore, Product, ProductStore, Role, User, UserStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_storefront_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_lines, carts, products, users, audit_log",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn create_test_order(owner: UserId, seller_id: SellerId) -> Order {
    let item = |name: &str, qty: u32| OrderItem {
        id: OrderItemId::new(),
        product_id: ProductId::new(),
        product_name: name.to_string(),
        quantity: qty,
        unit_price: Money::from_cents(500),
        seller_id,
        status: ItemStatus::Pending,
    };

    Order {
        id: OrderId::new(),
        owner,
        items: vec![item("Widget", 2), item("Gadget", 1)],
        total: Money::from_cents(2695),
        timestamp: Utc::now(),
        status: OrderStatus::Pending,
        cancelled_at: None,
        is_deleted: false,
        deleted_at: None,
    }
}

#[tokio::test]
#[serial]
async fn product_stock_floors_at_zero() {
    let store = get_test_store().await;
    let product = Product::new(SellerId::new(), "Widget", Money::from_cents(500), 3);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    assert_eq!(store.decrease_quantity(id, 5).await.unwrap(), Some(0));
    assert_eq!(store.increase_quantity(id, 2).await.unwrap(), Some(2));
    assert_eq!(
        store.decrease_quantity(ProductId::new(), 1).await.unwrap(),
        None
    );

    let loaded = store.find_product(id).await.unwrap().unwrap();
    assert_eq!(loaded.quantity, 2);
    assert_eq!(loaded.price, Money::from_cents(500));
}

#[tokio::test]
#[serial]
async fn product_stock_saturates_at_max() {
    let store = get_test_store().await;
    let product = Product::new(SellerId::new(), "Widget", Money::from_cents(500), u32::MAX - 1);
    let id = product.id;
    store.insert_product(product).await.unwrap();

    assert_eq!(store.increase_quantity(id, 10).await.unwrap(), Some(u32::MAX));
    assert_eq!(
        store.find_product(id).await.unwrap().unwrap().quantity,
        u32::MAX
    );
}

#[tokio::test]
#[serial]
async fn cart_lines_keep_insertion_order() {
    let store = get_test_store().await;
    let owner = UserId::new();
    let seller = SellerId::new();
    let line = |qty| CartLine {
        product_id: ProductId::new(),
        quantity: qty,
        seller_id: seller,
    };
    let first = line(1);
    let second = line(4);

    store
        .create_cart(Cart::with_line(owner, first.clone()))
        .await
        .unwrap();
    assert!(
        store
            .replace_cart_lines(owner, vec![first.clone(), second.clone()])
            .await
            .unwrap()
    );

    let cart = store.find_cart(owner).await.unwrap().unwrap();
    assert_eq!(cart.lines, vec![first, second]);

    assert!(store.delete_cart(owner).await.unwrap());
    assert!(store.find_cart(owner).await.unwrap().is_none());
    assert!(!store.replace_cart_lines(owner, vec![]).await.unwrap());
}

#[tokio::test]
#[serial]
async fn order_round_trips_with_items() {
    let store = get_test_store().await;
    let owner = UserId::new();
    let order = create_test_order(owner, SellerId::new());
    let id = order.id;
    store.insert_order(order.clone()).await.unwrap();

    let loaded = store.find_order(id).await.unwrap().unwrap();
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.items[0].product_name, "Widget");
    assert_eq!(loaded.items[1].product_name, "Gadget");
    assert_eq!(loaded.total, order.total);
    assert_eq!(loaded.status, OrderStatus::Pending);

    let listed = store.list_orders_by_owner(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[serial]
async fn item_status_and_patch_updates() {
    let store = get_test_store().await;
    let seller = SellerId::new();
    let order = create_test_order(UserId::new(), seller);
    let id = order.id;
    let item_id = order.items[0].id;
    store.insert_order(order).await.unwrap();

    assert!(
        !store
            .update_item_status(id, item_id, SellerId::new(), ItemStatus::Shipped)
            .await
            .unwrap()
    );
    assert!(
        store
            .update_item_status(id, item_id, seller, ItemStatus::Shipped)
            .await
            .unwrap()
    );
    assert!(
        store
            .update_order_fields(id, OrderPatch::status(OrderStatus::PartiallyShipped))
            .await
            .unwrap()
    );

    let loaded = store.find_order(id).await.unwrap().unwrap();
    assert_eq!(loaded.items[0].status, ItemStatus::Shipped);
    assert_eq!(loaded.items[1].status, ItemStatus::Pending);
    assert_eq!(loaded.status, OrderStatus::PartiallyShipped);
    assert!(loaded.cancelled_at.is_none());
}

#[tokio::test]
#[serial]
async fn soft_deleted_orders_only_visible_with_deleted() {
    let store = get_test_store().await;
    let owner = UserId::new();
    let order = create_test_order(owner, SellerId::new());
    let id = order.id;
    store.insert_order(order).await.unwrap();

    store
        .update_order_fields(id, OrderPatch::soft_deleted(Utc::now()))
        .await
        .unwrap();

    assert!(store.find_order(id).await.unwrap().is_none());
    assert!(store.list_orders().await.unwrap().is_empty());
    let deleted = store.find_order_with_deleted(id).await.unwrap().unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());
}

#[tokio::test]
#[serial]
async fn users_and_audit_round_trip() {
    let store = get_test_store().await;
    let user = User::new("Ada", "ada@example.com", Role::Customer);
    let user_id = user.id;
    store.insert_user(user.clone()).await.unwrap();
    assert_eq!(store.find_user(user_id).await.unwrap(), Some(user));

    let entry = AuditEntry::success("CREATE", "Order", "order-1", "created")
        .by(user_id)
        .after(serde_json::json!({"status": "PENDING"}));
    store.append_audit(entry).await.unwrap();

    let history = store.list_audit_for_entity("order-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, Some(user_id));
    assert_eq!(
        history[0].after_state,
        Some(serde_json::json!({"status": "PENDING"}))
    );
    assert_eq!(store.list_recent_audit(10).await.unwrap().len(), 1);
    assert_eq!(store.list_recent_audit(usize::MAX).await.unwrap().len(), 1);
}
