//! Cart pricing.

use common::Money;
use serde::Serialize;

/// Shipping and VAT applied to every cart summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat shipping charge per order.
    pub shipping: Money,
    /// VAT rate in basis points (1300 = 13 %).
    pub vat_basis_points: u32,
}

impl PricingPolicy {
    /// Prices a subtotal: adds shipping and VAT on the subtotal.
    ///
    /// Returns `None` when the total does not fit in a `Money`.
    pub fn summarize(&self, subtotal: Money) -> Option<PriceSummary> {
        let vat = subtotal.basis_points(self.vat_basis_points)?;
        let total = subtotal.checked_add(self.shipping)?.checked_add(vat)?;
        Some(PriceSummary {
            subtotal,
            shipping: self.shipping,
            vat,
            total,
        })
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping: Money::from_cents(1000),
            vat_basis_points: 1300,
        }
    }
}

/// Price breakdown of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub vat: Money,
    pub total: Money,
}
