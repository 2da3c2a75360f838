//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{Rejection, RejectionKind, ServiceError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// No caller identity on the request.
    #[error("missing or invalid x-user-id header")]
    Unauthenticated,
    /// The caller lacks the role the route requires.
    #[error("{0}")]
    Forbidden(String),
    /// A business rule refused the operation.
    #[error("{0}")]
    Rejected(Rejection),
    /// Service-layer error.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Rejections carry a user-facing message rather than an error
            ApiError::Rejected(rejection) => {
                let body = serde_json::json!({ "message": rejection.to_string() });
                return (rejection_status(rejection.kind()), axum::Json(body)).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiError::Unauthenticated.to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn rejection_status(kind: RejectionKind) -> StatusCode {
    match kind {
        RejectionKind::NotFound => StatusCode::NOT_FOUND,
        RejectionKind::Conflict => StatusCode::CONFLICT,
        RejectionKind::Forbidden => StatusCode::FORBIDDEN,
        RejectionKind::InvalidState => StatusCode::BAD_REQUEST,
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    match &err {
        ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Unauthorized(_) => (StatusCode::FORBIDDEN, err.to_string()),
        ServiceError::Notification(_) => {
            tracing::error!(error = %err, "notification failed");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        ServiceError::Internal(_) | ServiceError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::Rejected(rejection)
    }
}
