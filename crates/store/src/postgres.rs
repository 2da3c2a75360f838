use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{AuditId, Money, OrderId, OrderItemId, ProductId, SellerId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AuditEntry, Cart, CartLine, ItemStatus, Order, OrderItem, OrderPatch, Product, Result,
    StoreError, User,
    store::{AuditStore, CartStore, OrderStore, ProductStore, UserStore},
};

const ORDER_COLUMNS: &str =
    "id, owner, total_cents, timestamp, status, cancelled_at, is_deleted, deleted_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            seller_id: SellerId::from_uuid(row.try_get("seller_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: to_quantity(row.try_get("quantity")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id")?),
            owner: UserId::from_uuid(row.try_get("owner")?),
            items,
            total: Money::from_cents(row.try_get("total_cents")?),
            timestamp: row.try_get("timestamp")?,
            status: status.parse()?,
            cancelled_at: row.try_get("cancelled_at")?,
            is_deleted: row.try_get("is_deleted")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let status: String = row.try_get("status")?;
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get("id")?),
            product_id: ProductId::from_uuid(row.try_get("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: to_quantity(row.try_get("quantity")?)?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            seller_id: SellerId::from_uuid(row.try_get("seller_id")?),
            status: status.parse()?,
        })
    }

    fn row_to_audit(row: PgRow) -> Result<AuditEntry> {
        let status: String = row.try_get("status")?;
        Ok(AuditEntry {
            id: AuditId::from_uuid(row.try_get("id")?),
            action: row.try_get("action")?,
            entity: row.try_get("entity")?,
            entity_id: row.try_get("entity_id")?,
            user_id: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            status: status.parse()?,
            before_state: row.try_get("before_state")?,
            after_state: row.try_get("after_state")?,
            message: row.try_get("message")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    /// Loads the items of the given orders, grouped by order and kept in
    /// their original position.
    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents, seller_id, status
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            grouped
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }
        Ok(grouped)
    }

    async fn hydrate_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|r| r.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn fetch_order(&self, id: OrderId, include_deleted: bool) -> Result<Option<Order>> {
        let sql = if include_deleted {
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1")
        } else {
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND NOT is_deleted")
        };
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn write_cart_lines(
        tx: &mut Transaction<'_, Postgres>,
        owner: UserId,
        lines: &[CartLine],
    ) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE owner = $1")
            .bind(owner.as_uuid())
            .execute(&mut **tx)
            .await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_lines (owner, position, product_id, quantity, seller_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(owner.as_uuid())
            .bind(position as i32)
            .bind(line.product_id.as_uuid())
            .bind(i64::from(line.quantity))
            .bind(line.seller_id.as_uuid())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn to_quantity(raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt(format!("quantity out of range: {raw}")))
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, seller_id, name, price_cents, quantity, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, price_cents, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.seller_id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i64::from(product.quantity))
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn decrease_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET quantity = GREATEST(quantity - $2, 0) WHERE id = $1 RETURNING quantity",
        )
        .bind(id.as_uuid())
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await?;

        quantity.map(to_quantity).transpose()
    }

    async fn increase_quantity(&self, id: ProductId, amount: u32) -> Result<Option<u32>> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET quantity = LEAST(quantity + $2, $3) WHERE id = $1 RETURNING quantity",
        )
        .bind(id.as_uuid())
        .bind(i64::from(amount))
        .bind(i64::from(u32::MAX))
        .fetch_optional(&self.pool)
        .await?;

        quantity.map(to_quantity).transpose()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn find_cart(&self, owner: UserId) -> Result<Option<Cart>> {
        let updated_at: Option<chrono::DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM carts WHERE owner = $1")
                .bind(owner.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        let Some(updated_at) = updated_at else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, seller_id
            FROM cart_lines
            WHERE owner = $1
            ORDER BY position ASC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(|row| {
                Ok(CartLine {
                    product_id: ProductId::from_uuid(row.try_get("product_id")?),
                    quantity: to_quantity(row.try_get("quantity")?)?,
                    seller_id: SellerId::from_uuid(row.try_get("seller_id")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Cart {
            owner,
            lines,
            updated_at,
        }))
    }

    async fn create_cart(&self, cart: Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (owner, updated_at) VALUES ($1, $2)
            ON CONFLICT (owner) DO UPDATE SET updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.owner.as_uuid())
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::write_cart_lines(&mut tx, cart.owner, &cart.lines).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_cart_lines(&self, owner: UserId, lines: Vec<CartLine>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE carts SET updated_at = NOW() WHERE owner = $1")
            .bind(owner.as_uuid())
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        Self::write_cart_lines(&mut tx, owner, &lines).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_cart(&self, owner: UserId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM carts WHERE owner = $1")
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        self.fetch_order(id, false).await
    }

    async fn find_order_with_deleted(&self, id: OrderId) -> Result<Option<Order>> {
        self.fetch_order(id, true).await
    }

    async fn list_orders_by_owner(&self, owner: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE owner = $1 AND NOT is_deleted ORDER BY timestamp DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_orders(rows).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE NOT is_deleted ORDER BY timestamp DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        self.hydrate_orders(rows).await
    }

    async fn insert_order(&self, order: Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, owner, total_cents, timestamp, status, cancelled_at, is_deleted, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.owner.as_uuid())
        .bind(order.total.cents())
        .bind(order.timestamp)
        .bind(order.status.as_str())
        .bind(order.cancelled_at)
        .bind(order.is_deleted)
        .bind(order.deleted_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, product_name, quantity, unit_price_cents, seller_id, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(item.seller_id.as_uuid())
            .bind(item.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, items = order.items.len(), "order inserted");
        Ok(())
    }

    async fn update_order_fields(&self, id: OrderId, patch: OrderPatch) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE orders SET
                status = COALESCE($2, status),
                cancelled_at = COALESCE($3, cancelled_at),
                is_deleted = COALESCE($4, is_deleted),
                deleted_at = COALESCE($5, deleted_at)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.cancelled_at)
        .bind(patch.is_deleted)
        .bind(patch.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    async fn update_item_status(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        seller_id: SellerId,
        status: ItemStatus,
    ) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE order_items SET status = $4 WHERE order_id = $1 AND id = $2 AND seller_id = $3",
        )
        .bind(order_id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(seller_id.as_uuid())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let role: String = row.try_get("role")?;
            Ok(User {
                id: UserId::from_uuid(row.try_get("id")?),
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                role: role.parse()?,
            })
        })
        .transpose()
    }

    async fn insert_user(&self, user: User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, action, entity, entity_id, user_id, status, before_state, after_state, message, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.action)
        .bind(&entry.entity)
        .bind(&entry.entity_id)
        .bind(entry.user_id.map(|u| u.as_uuid()))
        .bind(entry.status.as_str())
        .bind(&entry.before_state)
        .bind(&entry.after_state)
        .bind(&entry.message)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_for_entity(&self, entity_id: &str) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, action, entity, entity_id, user_id, status, before_state, after_state, message, timestamp
            FROM audit_log
            WHERE entity_id = $1
            ORDER BY timestamp DESC
            "#,
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_audit).collect()
    }

    async fn list_recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, action, entity, entity_id, user_id, status, before_state, after_state, message, timestamp
            FROM audit_log
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_audit).collect()
    }
}
