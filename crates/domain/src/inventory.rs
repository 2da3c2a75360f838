//! Stock adjustments on behalf of orders.

use common::ProductId;
use store::ProductStore;

use crate::error::ServiceError;

/// Adjusts product stock. Stock never goes below zero.
///
/// Each call is one atomic store update. Callers are responsible for calling
/// exactly once per item per lifecycle transition.
#[derive(Clone)]
pub struct InventoryAdjuster<P: ProductStore> {
    products: P,
}

impl<P: ProductStore> InventoryAdjuster<P> {
    pub fn new(products: P) -> Self {
        Self { products }
    }

    /// Removes `amount` units from stock, flooring at zero.
    ///
    /// Does not check that enough stock is available. Returns the new stock.
    #[tracing::instrument(skip(self))]
    pub async fn decrease(&self, product_id: ProductId, amount: u32) -> Result<u32, ServiceError> {
        let stock = self
            .products
            .decrease_quantity(product_id, amount)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        metrics::counter!("inventory_adjustments_total", "direction" => "decrease").increment(1);
        tracing::debug!(%product_id, amount, stock, "stock decreased");
        Ok(stock)
    }

    /// Returns `amount` units to stock. Returns the new stock.
    #[tracing::instrument(skip(self))]
    pub async fn increase(&self, product_id: ProductId, amount: u32) -> Result<u32, ServiceError> {
        let stock = self
            .products
            .increase_quantity(product_id, amount)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        metrics::counter!("inventory_adjustments_total", "direction" => "increase").increment(1);
        tracing::debug!(%product_id, amount, stock, "stock increased");
        Ok(stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, SellerId};
    use store::{InMemoryStore, Product};

    async fn setup(quantity: u32) -> (InventoryAdjuster<InMemoryStore>, ProductId) {
        let store = InMemoryStore::new();
        let product = Product::new(SellerId::new(), "Widget", Money::from_cents(500), quantity);
        let id = product.id;
        store.insert_product(product).await.unwrap();
        (InventoryAdjuster::new(store), id)
    }

    #[tokio::test]
    async fn test_decrease_and_increase() {
        let (inventory, id) = setup(10).await;
        assert_eq!(inventory.decrease(id, 3).await.unwrap(), 7);
        assert_eq!(inventory.increase(id, 3).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_decrease_clamps_at_zero() {
        let (inventory, id) = setup(2).await;
        assert_eq!(inventory.decrease(id, 5).await.unwrap(), 0);
        assert_eq!(inventory.decrease(id, 1).await.unwrap(), 0);
        assert_eq!(inventory.increase(id, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stock_never_negative_over_any_sequence() {
        let (inventory, id) = setup(4).await;
        let steps: [(bool, u32); 8] = [
            (false, 3),
            (false, 3),
            (true, 1),
            (false, 7),
            (true, 2),
            (false, 1),
            (false, 1),
            (false, 1),
        ];
        let mut expected: u32 = 4;
        for (up, amount) in steps {
            let stock = if up {
                expected += amount;
                inventory.increase(id, amount).await.unwrap()
            } else {
                expected = expected.saturating_sub(amount);
                inventory.decrease(id, amount).await.unwrap()
            };
            assert_eq!(stock, expected);
        }
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let (inventory, _) = setup(1).await;
        let err = inventory.decrease(ProductId::new(), 1).await.unwrap_err();
        assert!(err.is_not_found());
        let err = inventory.increase(ProductId::new(), 1).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
