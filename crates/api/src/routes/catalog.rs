//! Catalog and user seeding endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ProductId, SellerId, UserId};
use domain::ServiceError;
use serde::{Deserialize, Serialize};
use store::{Product, ProductStore, Role, Storage, User, UserStore};

use super::{AppState, parse_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub seller_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            seller_id: p.seller_id.to_string(),
            name: p.name,
            price_cents: p.price.cents(),
            quantity: p.quantity,
        }
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}

// -- Handlers --

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create_product<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let seller_id: SellerId = parse_id(&req.seller_id)?;
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "price_cents must not be negative".to_string(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let product = Product::new(
        seller_id,
        req.name,
        Money::from_cents(req.price_cents),
        req.quantity,
    );
    state
        .store
        .insert_product(product.clone())
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(product_id = %product.id, %seller_id, "product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/{id} — load a product with its current stock.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let product = state
        .store
        .find_product(product_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}

/// POST /users — register a user.
#[tracing::instrument(skip(state, req))]
pub async fn create_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "Invalid email address: {}",
            req.email
        )));
    }

    let user = User::new(req.name, req.email, req.role);
    state
        .store
        .insert_user(user.clone())
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/{id} — load a user.
#[tracing::instrument(skip(state))]
pub async fn get_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id: UserId = parse_id(&id)?;
    let user = state
        .store
        .find_user(user_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    Ok(Json(user.into()))
}
