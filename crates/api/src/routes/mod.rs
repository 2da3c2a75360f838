//! HTTP handlers and the state they share.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod seller;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{LoggingNotifier, OrderLifecycle, Outcome, ServiceError};
use serde::Serialize;
use store::{Role, Storage, UserStore};

use crate::error::ApiError;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage> {
    pub store: S,
    pub orders: OrderLifecycle<S, LoggingNotifier>,
}

/// The caller, identified by the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<St: Send + Sync> FromRequestParts<St> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;
        UserId::parse(value.trim())
            .map(Caller)
            .map_err(|_| ApiError::Unauthenticated)
    }
}

impl<S: Storage> AppState<S> {
    /// Checks that the caller is a registered user with the given role.
    pub async fn require_role(&self, caller: Caller, role: Role) -> Result<(), ApiError> {
        let user = self
            .store
            .find_user(caller.0)
            .await
            .map_err(ServiceError::from)?;
        match user {
            Some(user) if user.role == role => Ok(()),
            _ => Err(ApiError::Forbidden(format!(
                "{} role required",
                role.as_str().to_lowercase()
            ))),
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Turns a soft outcome into a `{"message"}` body or a rejection error.
pub(crate) fn outcome_response(outcome: Outcome) -> Result<Json<MessageResponse>, ApiError> {
    match outcome {
        Outcome::Applied(message) => Ok(MessageResponse::new(message)),
        Outcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// Parses a path segment as an identifier.
pub(crate) fn parse_id<T>(id: &str) -> Result<T, ApiError>
where
    T: From<uuid::Uuid>,
{
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
