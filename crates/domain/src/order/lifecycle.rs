//! Write-side order operations.

use chrono::Utc;
use common::{OrderId, OrderItemId, SellerId, UserId};
use serde::Serialize;
use serde_json::json;
use store::{AuditEntry, ItemStatus, Order, OrderItem, OrderPatch, Storage};

use crate::audit::AuditRecorder;
use crate::cart::CartService;
use crate::error::ServiceError;
use crate::inventory::InventoryAdjuster;
use crate::notify::Notifier;
use crate::outcome::{Outcome, Rejection};
use crate::pricing::PricingPolicy;

use super::builder::{build_order, joined_item_names};
use super::status::derive_status;

/// Drives orders from cart conversion to cancellation and deletion.
///
/// Steps of each operation run strictly in sequence against the store.
/// Nothing is rolled back: a failure part way leaves earlier steps applied.
#[derive(Clone)]
pub struct OrderLifecycle<S, N>
where
    S: Storage,
    N: Notifier,
{
    pub(super) store: S,
    carts: CartService<S>,
    inventory: InventoryAdjuster<S>,
    audit: AuditRecorder<S>,
    notifier: N,
}

impl<S, N> OrderLifecycle<S, N>
where
    S: Storage,
    N: Notifier,
{
    /// Creates a new lifecycle service sharing one store handle.
    pub fn new(store: S, notifier: N, pricing: PricingPolicy) -> Self {
        Self {
            carts: CartService::new(store.clone(), pricing),
            inventory: InventoryAdjuster::new(store.clone()),
            audit: AuditRecorder::new(store.clone()),
            store,
            notifier,
        }
    }

    /// Returns the cart service used for order creation.
    pub fn carts(&self) -> &CartService<S> {
        &self.carts
    }

    /// Returns the audit recorder.
    pub fn audit(&self) -> &AuditRecorder<S> {
        &self.audit
    }

    /// Converts the customer's cart into a pending order.
    ///
    /// Stock is decremented once per line and the cart is cleared. The
    /// confirmation is sent last; if it fails the error is returned even
    /// though the order already exists.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, customer_id: UserId) -> Result<Outcome, ServiceError> {
        let start = std::time::Instant::now();

        let Some(cart) = self.store.find_cart(customer_id).await? else {
            return Ok(Rejection::CartNotFound.into());
        };
        if cart.is_empty() {
            return Ok(Rejection::CartEmpty.into());
        }

        let summary = match self.carts.summarize(customer_id).await {
            Ok(summary) => summary,
            Err(e) if e.is_not_found() => {
                return Ok(Rejection::CartUnpriced(e.to_string()).into());
            }
            Err(e) => return Err(e),
        };

        // Resolve every product before touching stock
        let mut resolved = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let product = self
                .store
                .find_product(line.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;
            resolved.push((line.clone(), product));
        }

        for (line, _) in &resolved {
            self.inventory
                .decrease(line.product_id, line.quantity)
                .await?;
        }

        let order = build_order(customer_id, &resolved, summary.total, Utc::now());
        self.store.insert_order(order.clone()).await?;

        if let Err(e) = self.carts.clear_cart(customer_id).await {
            tracing::warn!(%customer_id, error = %e, "failed to clear cart after order creation");
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, %customer_id, total = %order.total, "order created");

        let user = self
            .store
            .find_user(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", customer_id))?;

        let names = joined_item_names(&order);
        if let Err(e) = self
            .notifier
            .send_order_confirmation(&order, &user, &names)
            .await
        {
            metrics::counter!("notifications_failed_total", "kind" => "confirmation")
                .increment(1);
            self.audit
                .record(
                    AuditEntry::failure(
                        "CREATE",
                        "Order",
                        order.id,
                        format!("Order created but confirmation failed: {e}"),
                    )
                    .by(customer_id)
                    .after(snapshot(&order)),
                )
                .await;
            return Err(e.into());
        }

        self.audit
            .record(
                AuditEntry::success("CREATE", "Order", order.id, "Order created")
                    .by(customer_id)
                    .after(snapshot(&order)),
            )
            .await;

        Ok(Outcome::applied("Order created successfully"))
    }

    /// Moves one of the seller's items to a new status and re-derives the
    /// order's aggregate status.
    ///
    /// Cancellation is only allowed from `Pending` and returns the item's
    /// quantity to stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_item_status(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        seller_id: SellerId,
        new_status: ItemStatus,
    ) -> Result<Outcome, ServiceError> {
        let Some(order) = self.store.find_order(order_id).await? else {
            return Ok(Rejection::OrderNotFound.into());
        };

        let item = order
            .items
            .iter()
            .find(|i| i.id == item_id && i.seller_id == seller_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Order item", item_id))?;

        if new_status == ItemStatus::Cancelled {
            if !item.status.can_cancel() {
                return Ok(Rejection::OnlyPendingItemsCancellable.into());
            }
            self.restock(&item).await?;
        }

        if !self
            .store
            .update_item_status(order_id, item_id, seller_id, new_status)
            .await?
        {
            return Err(ServiceError::Internal(format!(
                "item {item_id} vanished from order {order_id}"
            )));
        }

        let mut updated = order.clone();
        if let Some(i) = updated.items.iter_mut().find(|i| i.id == item_id) {
            i.status = new_status;
        }
        let derived = derive_status(&updated.item_statuses());
        if derived != order.status {
            self.store
                .update_order_fields(order_id, OrderPatch::status(derived))
                .await?;
            updated.status = derived;
        }

        metrics::counter!("order_item_status_changes_total", "status" => new_status.as_str())
            .increment(1);
        tracing::info!(
            %order_id,
            %item_id,
            from = %item.status,
            to = %new_status,
            order_status = %updated.status,
            "order item status changed"
        );

        if new_status == ItemStatus::Shipped {
            self.notify_shipped(&updated, &item).await;
        }

        self.audit
            .record(
                AuditEntry::success(
                    "UPDATE_ITEM_STATUS",
                    "Order",
                    order_id,
                    format!("Item {} set to {new_status}", item.product_name),
                )
                .by(UserId::from_uuid(seller_id.as_uuid()))
                .before(json!({
                    "item_id": item_id,
                    "item_status": item.status,
                    "order_status": order.status,
                }))
                .after(json!({
                    "item_id": item_id,
                    "item_status": new_status,
                    "order_status": updated.status,
                })),
            )
            .await;

        Ok(Outcome::applied(format!(
            "Order item status updated to {new_status}"
        )))
    }

    /// Cancels a pending order on behalf of its owner.
    ///
    /// Items not already cancelled are restocked and cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        customer_id: UserId,
    ) -> Result<Outcome, ServiceError> {
        let order = self.require_order(order_id).await?;

        if order.owner != customer_id {
            return Ok(Rejection::NotOwner("cancel").into());
        }
        if !order.status.customer_can_cancel() {
            return Ok(Rejection::OnlyPendingOrdersCancellable.into());
        }

        for item in order
            .items
            .iter()
            .filter(|i| i.status != ItemStatus::Cancelled)
        {
            self.cancel_item(order_id, item).await?;
        }

        let cancelled = self.mark_cancelled(&order).await?;

        metrics::counter!("orders_cancelled_total", "path" => "customer").increment(1);
        tracing::info!(%order_id, %customer_id, "order cancelled by customer");

        self.audit
            .record(
                AuditEntry::success("CANCEL", "Order", order_id, "Order cancelled by customer")
                    .by(customer_id)
                    .before(snapshot(&order))
                    .after(snapshot(&cancelled)),
            )
            .await;

        Ok(Outcome::applied("Order cancelled successfully"))
    }

    /// Cancels a pending or shipped order as an administrator.
    ///
    /// Every item is restocked and cancelled, whatever its current status.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order_admin(&self, order_id: OrderId) -> Result<Outcome, ServiceError> {
        let order = self.require_order(order_id).await?;

        if !order.status.admin_can_cancel() {
            return Ok(Rejection::NotCancellable(order.status).into());
        }

        for item in &order.items {
            self.cancel_item(order_id, item).await?;
        }

        let cancelled = self.mark_cancelled(&order).await?;

        metrics::counter!("orders_cancelled_total", "path" => "admin").increment(1);
        tracing::info!(%order_id, from = %order.status, "order cancelled by admin");

        self.audit
            .record(
                AuditEntry::success("CANCEL", "Order", order_id, "Order cancelled by admin")
                    .before(snapshot(&order))
                    .after(snapshot(&cancelled)),
            )
            .await;

        Ok(Outcome::applied("Order cancelled successfully"))
    }

    /// Soft-deletes one of the customer's orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(
        &self,
        order_id: OrderId,
        customer_id: UserId,
    ) -> Result<Outcome, ServiceError> {
        let order = self.require_order_with_deleted(order_id).await?;

        if order.is_deleted {
            return Ok(Rejection::AlreadyDeleted.into());
        }
        if order.owner != customer_id {
            return Ok(Rejection::NotOwner("delete").into());
        }
        if !order.status.customer_can_delete() {
            return Ok(Rejection::NotDeletable(order.status).into());
        }

        self.soft_delete(&order, Some(customer_id), "customer").await
    }

    /// Soft-deletes any order as an administrator.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order_admin(&self, order_id: OrderId) -> Result<Outcome, ServiceError> {
        let order = self.require_order_with_deleted(order_id).await?;

        if order.is_deleted {
            return Ok(Rejection::AlreadyDeleted.into());
        }

        self.soft_delete(&order, None, "admin").await
    }

    async fn require_order(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    async fn require_order_with_deleted(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .find_order_with_deleted(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Returns an item's quantity to stock.
    ///
    /// A product removed from the catalog since the order was placed is
    /// skipped with a warning.
    async fn restock(&self, item: &OrderItem) -> Result<(), ServiceError> {
        match self.inventory.increase(item.product_id, item.quantity).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "product missing, restock skipped"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn cancel_item(&self, order_id: OrderId, item: &OrderItem) -> Result<(), ServiceError> {
        self.restock(item).await?;
        self.store
            .update_item_status(order_id, item.id, item.seller_id, ItemStatus::Cancelled)
            .await?;
        Ok(())
    }

    async fn mark_cancelled(&self, order: &Order) -> Result<Order, ServiceError> {
        let patch = OrderPatch::cancelled(Utc::now());
        self.store.update_order_fields(order.id, patch.clone()).await?;

        let mut cancelled = order.clone();
        for item in &mut cancelled.items {
            item.status = ItemStatus::Cancelled;
        }
        patch.apply_to(&mut cancelled);
        Ok(cancelled)
    }

    async fn soft_delete(
        &self,
        order: &Order,
        actor: Option<UserId>,
        path: &'static str,
    ) -> Result<Outcome, ServiceError> {
        let patch = OrderPatch::soft_deleted(Utc::now());
        self.store.update_order_fields(order.id, patch.clone()).await?;

        let mut deleted = order.clone();
        patch.apply_to(&mut deleted);

        metrics::counter!("orders_deleted_total", "path" => path).increment(1);
        tracing::info!(order_id = %order.id, path, "order soft-deleted");

        let mut entry = AuditEntry::success("DELETE", "Order", order.id, "Order deleted")
            .before(snapshot(order))
            .after(snapshot(&deleted));
        if let Some(actor) = actor {
            entry = entry.by(actor);
        }
        self.audit.record(entry).await;

        Ok(Outcome::applied("Order deleted successfully"))
    }

    async fn notify_shipped(&self, order: &Order, item: &OrderItem) {
        let user = match self.store.find_user(order.owner).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(order_id = %order.id, owner = %order.owner, "order owner not found, shipment notification skipped");
                return;
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "failed to load order owner");
                return;
            }
        };

        if let Err(e) = self
            .notifier
            .send_order_shipped(order, &user, &item.product_name)
            .await
        {
            metrics::counter!("notifications_failed_total", "kind" => "shipped").increment(1);
            tracing::warn!(order_id = %order.id, item_id = %item.id, error = %e, "failed to send shipment notification");
        }
    }
}

fn snapshot<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}
