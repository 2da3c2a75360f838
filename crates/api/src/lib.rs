//! HTTP API for the storefront order engine.
//!
//! Exposes carts, orders, seller fulfillment and administration over REST,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{LoggingNotifier, OrderLifecycle, PricingPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        // Catalog and users
        .route("/products", post(routes::catalog::create_product::<S>))
        .route("/products/{id}", get(routes::catalog::get_product::<S>))
        .route("/users", post(routes::catalog::create_user::<S>))
        .route("/users/{id}", get(routes::catalog::get_user::<S>))
        // Cart
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/summary", get(routes::cart::summary::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::set_quantity::<S>).delete(routes::cart::remove_item::<S>),
        )
        // Customer orders
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>).delete(routes::orders::delete::<S>),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        // Sellers
        .route("/seller/orders", get(routes::seller::list::<S>))
        .route(
            "/seller/orders/{id}/items/{item_id}",
            put(routes::seller::update_item_status::<S>),
        )
        // Administration
        .route("/admin/orders", get(routes::admin::list::<S>))
        .route("/admin/orders/{id}", axum::routing::delete(routes::admin::delete::<S>))
        .route("/admin/orders/{id}/cancel", post(routes::admin::cancel::<S>))
        .route("/admin/audit", get(routes::admin::audit::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over a store.
///
/// Notifications are written to the log.
pub fn create_default_state<S: Storage>(store: S, pricing: PricingPolicy) -> Arc<AppState<S>> {
    let orders = OrderLifecycle::new(store.clone(), LoggingNotifier, pricing);
    Arc::new(AppState { store, orders })
}
