//! Order read queries.

use common::{OrderId, SellerId, UserId};
use store::{Order, Storage};

use crate::error::ServiceError;
use crate::notify::Notifier;

use super::lifecycle::OrderLifecycle;

/// Read side. Soft-deleted orders are never returned.
impl<S, N> OrderLifecycle<S, N>
where
    S: Storage,
    N: Notifier,
{
    /// Loads an order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Loads an order, refusing callers that do not own it.
    pub async fn get_order_for_customer(
        &self,
        order_id: OrderId,
        customer_id: UserId,
    ) -> Result<Order, ServiceError> {
        let order = self.get_order(order_id).await?;
        if order.owner != customer_id {
            return Err(ServiceError::Unauthorized(format!(
                "order {order_id} does not belong to the caller"
            )));
        }
        Ok(order)
    }

    /// Lists the customer's orders, newest first.
    pub async fn list_orders_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_orders_by_owner(customer_id).await?)
    }

    /// Lists orders holding at least one of the seller's items.
    ///
    /// Each order is narrowed to the seller's own items. The aggregate
    /// status and total still describe the whole order.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_for_seller(
        &self,
        seller_id: SellerId,
    ) -> Result<Vec<Order>, ServiceError> {
        let orders = self.store.list_orders().await?;
        Ok(orders
            .into_iter()
            .filter(|o| o.has_items_from(seller_id))
            .map(|mut o| {
                o.items.retain(|i| i.seller_id == seller_id);
                o
            })
            .collect())
    }

    /// Lists every order, newest first.
    pub async fn list_all_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_orders().await?)
    }
}
