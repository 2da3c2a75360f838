//! Service error types.

use store::StoreError;
use thiserror::Error;

use crate::notify::NotificationError;

/// Exceptional failures of a service operation.
///
/// Expected business-rule refusals are not errors; they are returned as
/// [`crate::Outcome::Rejected`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entity changed underneath the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An argument failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller may not access the entity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A notification that the caller waits on could not be delivered.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// An invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true for [`ServiceError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}
