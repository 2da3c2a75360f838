//! Customer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use serde::Serialize;
use store::{ItemStatus, Order, OrderStatus, Storage};

use super::{AppState, Caller, MessageResponse, outcome_response, parse_id};
use crate::error::ApiError;

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub timestamp: String,
    pub cancelled_at: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub seller_id: String,
    pub status: ItemStatus,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            owner: order.owner.to_string(),
            status: order.status,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    seller_id: item.seller_id.to_string(),
                    status: item.status,
                })
                .collect(),
            total_cents: order.total.cents(),
            timestamp: order.timestamp.to_rfc3339(),
            cancelled_at: order.cancelled_at.map(|at| at.to_rfc3339()),
        }
    }
}

pub(crate) fn order_list(orders: Vec<Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(OrderResponse::from).collect())
}

// -- Handlers --

/// POST /orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state))]
pub async fn create<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let outcome = state.orders.create_order(caller.0).await?;
    Ok((StatusCode::CREATED, outcome_response(outcome)?))
}

/// GET /orders — the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders_for_customer(caller.0).await?;
    Ok(order_list(orders))
}

/// GET /orders/{id} — one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .orders
        .get_order_for_customer(order_id, caller.0)
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/cancel — cancel one of the caller's pending orders.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let outcome = state.orders.cancel_order(order_id, caller.0).await?;
    outcome_response(outcome)
}

/// DELETE /orders/{id} — soft-delete one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let outcome = state.orders.delete_order(order_id, caller.0).await?;
    outcome_response(outcome)
}
