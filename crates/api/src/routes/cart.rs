//! Shopping cart endpoints. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::PriceSummary;
use serde::{Deserialize, Serialize};
use store::{Cart, Storage};

use super::{AppState, Caller, MessageResponse, outcome_response, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub owner: String,
    pub lines: Vec<CartLineResponse>,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub seller_id: String,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            owner: cart.owner.to_string(),
            lines: cart
                .lines
                .into_iter()
                .map(|l| CartLineResponse {
                    product_id: l.product_id.to_string(),
                    quantity: l.quantity,
                    seller_id: l.seller_id.to_string(),
                })
                .collect(),
            updated_at: cart.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub vat_cents: i64,
    pub total_cents: i64,
}

impl From<PriceSummary> for SummaryResponse {
    fn from(s: PriceSummary) -> Self {
        Self {
            subtotal_cents: s.subtotal.cents(),
            shipping_cents: s.shipping.cents(),
            vat_cents: s.vat.cents(),
            total_cents: s.total.cents(),
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.orders.carts().get_cart(caller.0).await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart — drop the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orders.carts().clear_cart(caller.0).await?;
    Ok(MessageResponse::new("Cart cleared"))
}

/// GET /cart/summary — price the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn summary<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.orders.carts().summarize(caller.0).await?;
    Ok(Json(summary.into()))
}

/// POST /cart/items — add a product to the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id: ProductId = parse_id(&req.product_id)?;
    let outcome = state
        .orders
        .carts()
        .add_item(caller.0, product_id, req.quantity)
        .await?;
    outcome_response(outcome)
}

/// PUT /cart/items/{product_id} — replace a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id: ProductId = parse_id(&product_id)?;
    let cart = state
        .orders
        .carts()
        .set_item_quantity(caller.0, product_id, req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/items/{product_id} — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id: ProductId = parse_id(&product_id)?;
    state
        .orders
        .carts()
        .remove_item(caller.0, product_id)
        .await?;
    Ok(MessageResponse::new("Item removed from cart"))
}
