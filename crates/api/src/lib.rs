//! HTTP API server with observability for the storefront checkout core.
//!
//! Provides REST endpoints for checkout, carts, order history and store
//! administration, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use checkout::{
    CartService, CatalogService, CheckoutConfig, InMemoryPaymentGateway, LogNotificationSink,
    NotificationSink, OrderService, OrderWorkflow, PaymentGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub workflow: OrderWorkflow<S>,
    pub orders: OrderService<S>,
    pub carts: CartService<S>,
    pub catalog: CatalogService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/my-orders", get(routes::orders::list_mine::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/receipt", get(routes::orders::receipt::<S>))
        .route(
            "/payments/{external_id}/capture",
            post(routes::payments::capture::<S>),
        )
        .route(
            "/cart",
            get(routes::cart::get::<S>)
                .post(routes::cart::add::<S>)
                .delete(routes::cart::clear::<S>),
        )
        .route(
            "/cart/{product_id}",
            put(routes::cart::update::<S>).delete(routes::cart::remove::<S>),
        )
        .route("/cart/merge", post(routes::cart::merge::<S>))
        .route("/admin/orders", get(routes::admin::list_orders::<S>))
        .route(
            "/admin/orders/{id}",
            patch(routes::admin::set_fulfillment_state::<S>),
        )
        .route(
            "/admin/products/{id}/stock",
            put(routes::admin::set_stock::<S>),
        )
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

/// Creates application state wired to the given collaborators.
pub fn create_state<S: StorefrontStore>(
    store: S,
    notifier: Arc<dyn NotificationSink>,
    payments: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
) -> Arc<AppState<S>> {
    let timeout = config.store_timeout;
    Arc::new(AppState {
        orders: OrderService::new(store.clone(), timeout),
        carts: CartService::new(store.clone(), timeout),
        catalog: CatalogService::new(store.clone(), timeout),
        workflow: OrderWorkflow::new(store, notifier, payments, config),
    })
}

/// Creates the default application state: log notifications and an
/// in-memory payment gateway.
pub fn create_default_state<S: StorefrontStore>(
    store: S,
    config: CheckoutConfig,
) -> Arc<AppState<S>> {
    create_state(
        store,
        Arc::new(LogNotificationSink),
        Arc::new(InMemoryPaymentGateway::new()),
        config,
    )
}
