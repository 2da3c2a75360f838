//! Shopping cart engine.

use common::{Money, ProductId, UserId};
use store::{Cart, CartLine, CartStore, ProductStore};

use crate::error::ServiceError;
use crate::outcome::{Outcome, Rejection};
use crate::pricing::{PriceSummary, PricingPolicy};

fn price_overflow() -> ServiceError {
    ServiceError::InvalidArgument("cart total exceeds the maximum amount".to_string())
}

/// Service for managing customer carts.
///
/// Each customer has at most one cart. Lines reference live products, so the
/// summary always prices at the current catalog price.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
    pricing: PricingPolicy,
}

impl<S> CartService<S>
where
    S: ProductStore + CartStore,
{
    /// Creates a new cart service.
    pub fn new(store: S, pricing: PricingPolicy) -> Self {
        Self { store, pricing }
    }

    /// Returns the pricing policy used for summaries.
    pub fn pricing(&self) -> PricingPolicy {
        self.pricing
    }

    /// Loads the customer's cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, customer_id: UserId) -> Result<Cart, ServiceError> {
        self.store
            .find_cart(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", customer_id))
    }

    /// Adds a product to the customer's cart, creating the cart if needed.
    ///
    /// A product already in the cart is refused rather than merged.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Outcome, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let line = CartLine {
            product_id,
            quantity,
            seller_id: product.seller_id,
        };

        match self.store.find_cart(customer_id).await? {
            None => {
                self.store
                    .create_cart(Cart::with_line(customer_id, line))
                    .await?;
            }
            Some(cart) if cart.contains(product_id) => {
                return Ok(Rejection::AlreadyInCart.into());
            }
            Some(mut cart) => {
                cart.lines.push(line);
                self.save_lines(customer_id, cart.lines).await?;
            }
        }

        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        tracing::info!(%customer_id, %product_id, quantity, "item added to cart");
        Ok(Outcome::applied("Item added to cart"))
    }

    /// Replaces the quantity of a line. Does not add to the existing quantity.
    #[tracing::instrument(skip(self))]
    pub async fn set_item_quantity(
        &self,
        customer_id: UserId,
        product_id: ProductId,
        amount: i64,
    ) -> Result<Cart, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be greater than 0".to_string(),
            ));
        }
        let amount = u32::try_from(amount).map_err(|_| {
            ServiceError::InvalidArgument(format!("quantity {amount} is too large"))
        })?;

        let mut cart = self.get_cart(customer_id).await?;
        let line = cart
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| ServiceError::not_found("Cart item", product_id))?;
        line.quantity = amount;

        self.save_lines(customer_id, cart.lines.clone()).await?;

        metrics::counter!("cart_mutations_total", "op" => "set_quantity").increment(1);
        Ok(cart)
    }

    /// Removes a line. Succeeds without change if the line or cart is absent.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ServiceError> {
        let Some(mut cart) = self.store.find_cart(customer_id).await? else {
            return Ok(());
        };
        if !cart.contains(product_id) {
            return Ok(());
        }

        cart.lines.retain(|l| l.product_id != product_id);
        self.save_lines(customer_id, cart.lines).await?;

        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        Ok(())
    }

    /// Deletes the customer's cart. Returns true if there was one.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, customer_id: UserId) -> Result<bool, ServiceError> {
        let deleted = self.store.delete_cart(customer_id).await?;
        if deleted {
            metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        }
        Ok(deleted)
    }

    /// Prices the cart at current product prices.
    ///
    /// Lines whose product no longer exists are left out of the subtotal.
    /// A total too large to represent is an `InvalidArgument`.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self, customer_id: UserId) -> Result<PriceSummary, ServiceError> {
        let cart = self.get_cart(customer_id).await?;

        let mut subtotal = Money::zero();
        for line in &cart.lines {
            match self.store.find_product(line.product_id).await? {
                Some(product) => {
                    subtotal = product
                        .price
                        .checked_mul(line.quantity)
                        .and_then(|line_total| subtotal.checked_add(line_total))
                        .ok_or_else(price_overflow)?;
                }
                None => {
                    tracing::debug!(product_id = %line.product_id, "skipping missing product in summary");
                }
            }
        }

        self.pricing.summarize(subtotal).ok_or_else(price_overflow)
    }

    async fn save_lines(
        &self,
        customer_id: UserId,
        lines: Vec<CartLine>,
    ) -> Result<(), ServiceError> {
        if !self.store.replace_cart_lines(customer_id, lines).await? {
            return Err(ServiceError::Conflict(format!(
                "cart for {customer_id} was removed during the update"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SellerId;
    use store::{InMemoryStore, Product};

    async fn setup() -> (CartService<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone(), PricingPolicy::default());
        (service, store)
    }

    async fn add_product(store: &InMemoryStore, price_cents: i64) -> Product {
        let product = Product::new(
            SellerId::new(),
            "Widget",
            Money::from_cents(price_cents),
            100,
        );
        store.insert_product(product.clone()).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_first_add_creates_cart() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();

        let outcome = service.add_item(customer, product.id, 2).await.unwrap();
        assert!(outcome.is_applied());

        let cart = service.get_cart(customer).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.lines[0].seller_id, product.seller_id);
    }

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let (service, store) = setup().await;
        let a = add_product(&store, 500).await;
        let b = add_product(&store, 700).await;
        let customer = UserId::new();

        service.add_item(customer, a.id, 1).await.unwrap();
        service.add_item(customer, b.id, 3).await.unwrap();

        let cart = service.get_cart(customer).await.unwrap();
        let ids: Vec<_> = cart.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_add_duplicate_is_rejected_without_merge() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();

        service.add_item(customer, product.id, 2).await.unwrap();
        let outcome = service.add_item(customer, product.id, 5).await.unwrap();

        assert_eq!(outcome, Outcome::Rejected(Rejection::AlreadyInCart));
        let cart = service.get_cart(customer).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (service, _) = setup().await;
        let err = service
            .add_item(UserId::new(), ProductId::new(), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_quantity_replaces() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();
        service.add_item(customer, product.id, 2).await.unwrap();

        let cart = service
            .set_item_quantity(customer, product.id, 7)
            .await
            .unwrap();
        assert_eq!(cart.lines[0].quantity, 7);

        let stored = service.get_cart(customer).await.unwrap();
        assert_eq!(stored.lines[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_set_quantity_validation() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();

        let err = service
            .set_item_quantity(customer, product.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err = service
            .set_item_quantity(customer, product.id, -3)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        // No cart yet
        let err = service
            .set_item_quantity(customer, product.id, 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // Cart without that line
        let other = add_product(&store, 100).await;
        service.add_item(customer, other.id, 1).await.unwrap();
        let err = service
            .set_item_quantity(customer, product.id, 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_item_is_idempotent() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();

        service.remove_item(customer, product.id).await.unwrap();

        service.add_item(customer, product.id, 1).await.unwrap();
        service.remove_item(customer, product.id).await.unwrap();
        service.remove_item(customer, product.id).await.unwrap();

        let cart = service.get_cart(customer).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();

        assert!(!service.clear_cart(customer).await.unwrap());
        service.add_item(customer, product.id, 1).await.unwrap();
        assert!(service.clear_cart(customer).await.unwrap());
        assert!(service.get_cart(customer).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_summary_scenario() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();
        service.add_item(customer, product.id, 2).await.unwrap();

        let summary = service.summarize(customer).await.unwrap();
        assert_eq!(summary.subtotal.cents(), 1000);
        assert_eq!(summary.shipping.cents(), 1000);
        assert_eq!(summary.vat.cents(), 130);
        assert_eq!(summary.total.cents(), 2130);
    }

    #[tokio::test]
    async fn test_summary_overflow_is_invalid_argument() {
        let (service, store) = setup().await;
        let product = add_product(&store, i64::MAX / 2).await;
        let customer = UserId::new();
        service.add_item(customer, product.id, 3).await.unwrap();

        let err = service.summarize(customer).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_summary_overflow_across_lines() {
        let (service, store) = setup().await;
        let first = add_product(&store, i64::MAX / 2).await;
        let second = add_product(&store, i64::MAX / 2).await;
        let customer = UserId::new();
        service.add_item(customer, first.id, 1).await.unwrap();
        service.add_item(customer, second.id, 1).await.unwrap();

        // Subtotal fits, shipping pushes it over
        let err = service.summarize(customer).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_summary_skips_missing_products() {
        let (service, store) = setup().await;
        let product = add_product(&store, 500).await;
        let customer = UserId::new();
        service.add_item(customer, product.id, 1).await.unwrap();

        // A line whose product has left the catalog
        let mut lines = service.get_cart(customer).await.unwrap().lines;
        lines.push(CartLine {
            product_id: ProductId::new(),
            quantity: 4,
            seller_id: SellerId::new(),
        });
        store.replace_cart_lines(customer, lines).await.unwrap();

        let summary = service.summarize(customer).await.unwrap();
        assert_eq!(summary.subtotal.cents(), 500);
        assert_eq!(summary.vat.cents(), 65);
        assert_eq!(summary.total.cents(), 1565);
    }

    #[tokio::test]
    async fn test_summary_uses_current_price() {
        let (service, store) = setup().await;
        let mut product = add_product(&store, 500).await;
        let customer = UserId::new();
        service.add_item(customer, product.id, 1).await.unwrap();

        product.price = Money::from_cents(900);
        store.insert_product(product).await.unwrap();

        let summary = service.summarize(customer).await.unwrap();
        assert_eq!(summary.subtotal.cents(), 900);
    }

    #[tokio::test]
    async fn test_summary_without_cart_is_not_found() {
        let (service, _) = setup().await;
        assert!(service.summarize(UserId::new()).await.unwrap_err().is_not_found());
    }
}
