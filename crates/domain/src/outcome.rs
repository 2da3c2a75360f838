//! Soft outcomes: expected refusals returned as values.

use store::OrderStatus;

/// Result of an operation that may be refused by a business rule.
///
/// `Rejected` is not an error. Callers branch on it instead of catching,
/// and the HTTP boundary maps it to a 4xx with a `message` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation took effect.
    Applied(String),
    /// The operation was refused; nothing was changed.
    Rejected(Rejection),
}

impl Outcome {
    pub fn applied(message: impl Into<String>) -> Self {
        Outcome::Applied(message.into())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// Returns the rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }

    /// Returns the user-facing message.
    pub fn message(&self) -> String {
        match self {
            Outcome::Applied(msg) => msg.clone(),
            Outcome::Rejected(r) => r.to_string(),
        }
    }
}

impl From<Rejection> for Outcome {
    fn from(rejection: Rejection) -> Self {
        Outcome::Rejected(rejection)
    }
}

/// How a rejection should be classified at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    NotFound,
    Conflict,
    Forbidden,
    InvalidState,
}

/// A business-rule refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    CartNotFound,
    CartEmpty,
    /// The cart could not be priced; carries the underlying message.
    CartUnpriced(String),
    AlreadyInCart,
    OrderNotFound,
    OnlyPendingItemsCancellable,
    OnlyPendingOrdersCancellable,
    /// Admin cancellation from a status other than pending or shipped.
    NotCancellable(OrderStatus),
    /// The caller does not own the order. Carries the attempted action.
    NotOwner(&'static str),
    AlreadyDeleted,
    NotDeletable(OrderStatus),
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::CartNotFound | Rejection::OrderNotFound => RejectionKind::NotFound,
            Rejection::AlreadyInCart | Rejection::AlreadyDeleted => RejectionKind::Conflict,
            Rejection::NotOwner(_) => RejectionKind::Forbidden,
            Rejection::CartEmpty
            | Rejection::CartUnpriced(_)
            | Rejection::OnlyPendingItemsCancellable
            | Rejection::OnlyPendingOrdersCancellable
            | Rejection::NotCancellable(_)
            | Rejection::NotDeletable(_) => RejectionKind::InvalidState,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::CartNotFound => f.write_str("Cart not found for user"),
            Rejection::CartEmpty => f.write_str("Cart is empty"),
            Rejection::CartUnpriced(reason) => {
                write!(f, "Failed to calculate cart summary: {reason}")
            }
            Rejection::AlreadyInCart => f.write_str("Product already in cart"),
            Rejection::OrderNotFound => f.write_str("Order not found"),
            Rejection::OnlyPendingItemsCancellable => {
                f.write_str("Only items with status 'PENDING' can be cancelled.")
            }
            Rejection::OnlyPendingOrdersCancellable => {
                f.write_str("Only pending orders can be cancelled")
            }
            Rejection::NotCancellable(status) => write!(
                f,
                "Only pending or shipped orders can be cancelled (order is {status})"
            ),
            Rejection::NotOwner(action) => write!(f, "Unauthorized to {action} this order"),
            Rejection::AlreadyDeleted => f.write_str("Order already deleted"),
            Rejection::NotDeletable(status) => write!(
                f,
                "Only pending, cancelled or delivered orders can be deleted (order is {status})"
            ),
        }
    }
}
