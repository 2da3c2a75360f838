//! Administrator endpoints. The caller must hold the admin role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use serde::{Deserialize, Serialize};
use store::{AuditEntry, AuditStatus, Role, Storage};

use super::orders::{OrderResponse, order_list};
use super::{AppState, Caller, MessageResponse, outcome_response, parse_id};
use crate::error::ApiError;

const DEFAULT_AUDIT_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub entity_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AuditEntryResponse {
    pub id: String,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub user_id: Option<String>,
    pub status: AuditStatus,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub message: String,
    pub timestamp: String,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(e: AuditEntry) -> Self {
        Self {
            id: e.id.to_string(),
            action: e.action,
            entity: e.entity,
            entity_id: e.entity_id,
            user_id: e.user_id.map(|u| u.to_string()),
            status: e.status,
            before_state: e.before_state,
            after_state: e.after_state,
            message: e.message,
            timestamp: e.timestamp.to_rfc3339(),
        }
    }
}

/// GET /admin/orders — every live order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    state.require_role(caller, Role::Admin).await?;
    let orders = state.orders.list_all_orders().await?;
    Ok(order_list(orders))
}

/// POST /admin/orders/{id}/cancel — cancel a pending or shipped order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.require_role(caller, Role::Admin).await?;
    let order_id: OrderId = parse_id(&id)?;
    let outcome = state.orders.cancel_order_admin(order_id).await?;
    outcome_response(outcome)
}

/// DELETE /admin/orders/{id} — soft-delete any order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.require_role(caller, Role::Admin).await?;
    let order_id: OrderId = parse_id(&id)?;
    let outcome = state.orders.delete_order_admin(order_id).await?;
    outcome_response(outcome)
}

/// GET /admin/audit — audit history for one entity, or the most recent entries.
#[tracing::instrument(skip(state, query))]
pub async fn audit<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError> {
    state.require_role(caller, Role::Admin).await?;
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);

    let entries = match query.entity_id.as_deref() {
        Some(entity_id) => {
            let mut entries = state.orders.audit().history(entity_id).await?;
            entries.truncate(limit);
            entries
        }
        None => state.orders.audit().recent(limit).await?,
    };

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
