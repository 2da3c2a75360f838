use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Returns the given share of this amount, expressed in basis points
    /// (1/100 of a percent), rounded half away from zero to the cent.
    /// `None` when the result does not fit.
    ///
    /// `Money::from_cents(1000).basis_points(1300)` is 13 % of $10.00, i.e. $1.30.
    pub fn basis_points(&self, basis_points: u32) -> Option<Money> {
        let scaled = i128::from(self.cents) * i128::from(basis_points);
        let half = if scaled < 0 { -5_000 } else { 5_000 };
        i64::try_from((scaled + half) / 10_000)
            .ok()
            .map(Money::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a.checked_add(b).unwrap().cents(), 1500);
        assert_eq!(a.checked_mul(3).unwrap().cents(), 3000);
    }

    #[test]
    fn test_arithmetic_overflow_is_none() {
        let big = Money::from_cents(i64::MAX / 2);
        assert!(big.checked_mul(3).is_none());
        assert!(big.checked_add(big).unwrap().checked_add(big).is_none());
        assert!(Money::from_cents(i64::MAX).basis_points(20_000).is_none());
    }

    #[test]
    fn test_basis_points_exact() {
        assert_eq!(Money::from_cents(1000).basis_points(1300), Some(Money::from_cents(130)));
        assert_eq!(Money::zero().basis_points(1300), Some(Money::zero()));
    }

    #[test]
    fn test_basis_points_rounds_half_up() {
        // 13 % of $0.50 is 6.5 cents
        assert_eq!(Money::from_cents(50).basis_points(1300), Some(Money::from_cents(7)));
        // 13 % of $0.10 is 1.3 cents
        assert_eq!(Money::from_cents(10).basis_points(1300), Some(Money::from_cents(1)));
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(2130)).unwrap();
        assert_eq!(json, "2130");
    }
}
