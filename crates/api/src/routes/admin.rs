//! Store administration: order listing, fulfillment and stock levels.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::FulfillmentState;
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{AdminUser, ValidJson};
use crate::routes::orders::OrderResponse;
use crate::routes::{parse_order_id, parse_product_id};

#[derive(Debug, Deserialize)]
pub struct FulfillmentRequest {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: u32,
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub product_id: String,
    pub name: String,
    pub stock: u32,
}

/// GET /admin/orders: Every order, newest first.
#[tracing::instrument(skip(state, _admin))]
pub async fn list_orders<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_all_orders().await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// PATCH /admin/orders/{id}: Advance the fulfillment state.
#[tracing::instrument(skip(state, req), fields(admin = %admin.0.user_id))]
pub async fn set_fulfillment_state<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<FulfillmentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let next: FulfillmentState = req
        .state
        .trim()
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let order = state.orders.set_fulfillment_state(order_id, next).await?;
    tracing::info!(%order_id, state = %next, "fulfillment state updated");

    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /admin/products/{id}/stock: Overwrite a product's stock level.
#[tracing::instrument(skip(state, req), fields(admin = %admin.0.user_id))]
pub async fn set_stock<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let product = state.catalog.set_stock(&product_id, req.stock).await?;

    Ok(Json(StockResponse {
        product_id: product.id.to_string(),
        name: product.name,
        stock: product.stock,
    }))
}
