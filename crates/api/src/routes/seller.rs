//! Seller fulfillment endpoints. The caller must hold the seller role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, OrderItemId, SellerId};
use serde::Deserialize;
use store::{ItemStatus, Role, Storage};

use super::orders::{OrderResponse, order_list};
use super::{AppState, Caller, MessageResponse, outcome_response, parse_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpdateItemStatusRequest {
    pub status: ItemStatus,
}

fn seller_id(caller: Caller) -> SellerId {
    SellerId::from_uuid(caller.0.as_uuid())
}

/// GET /seller/orders — orders holding the caller's items, narrowed to them.
#[tracing::instrument(skip(state))]
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    state.require_role(caller, Role::Seller).await?;
    let orders = state.orders.list_orders_for_seller(seller_id(caller)).await?;
    Ok(order_list(orders))
}

/// PUT /seller/orders/{id}/items/{item_id} — move one of the caller's items.
#[tracing::instrument(skip(state, req))]
pub async fn update_item_status<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<UpdateItemStatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.require_role(caller, Role::Seller).await?;
    let order_id: OrderId = parse_id(&id)?;
    let item_id: OrderItemId = parse_id(&item_id)?;

    let outcome = state
        .orders
        .update_order_item_status(order_id, item_id, seller_id(caller), req.status)
        .await?;
    outcome_response(outcome)
}
