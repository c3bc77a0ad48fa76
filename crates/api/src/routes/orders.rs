//! Checkout and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use checkout::{LineRequest, OrderRequest, Viewer};
use domain::{CustomerInfo, Order};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{CurrentUser, ValidJson};
use crate::routes::parse_order_id;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub customer: CustomerRequest,
}

/// One requested line. Any price-like field a client sends is ignored.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub quantity: Option<Value>,
}

impl OrderItemRequest {
    pub(crate) fn to_line(&self) -> LineRequest {
        LineRequest::new(self.product_id.as_str(), normalize_quantity(self.quantity.as_ref()))
    }
}

/// Shipping details. Missing mandatory fields are reported by name by the
/// checkout services rather than as a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

impl From<CustomerRequest> for CustomerInfo {
    fn from(req: CustomerRequest) -> Self {
        CustomerInfo {
            name: req.name,
            email: req.email,
            address: req.address,
            city: req.city,
            postal_code: req.postal_code,
        }
    }
}

/// Missing, non-numeric and non-positive quantities count as 1.
pub(crate) fn normalize_quantity(raw: Option<&Value>) -> i64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.filter(|q| *q > 0).unwrap_or(1)
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub state: &'static str,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub currency: String,
    pub customer: CustomerInfo,
    pub payment: Option<PaymentResponse>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub external_id: String,
    pub status: String,
    pub captured_amount_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().map(|u| u.to_string()),
            state: order.fulfillment_state().as_str(),
            items: order
                .lines()
                .iter()
                .map(|line| OrderItemResponse {
                    product_id: line.product_id.to_string(),
                    name: line.name.clone(),
                    image: line.image.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total().cents(),
            currency: order.currency().to_string(),
            customer: order.customer().clone(),
            payment: order.payment().map(|p| PaymentResponse {
                external_id: p.external_id.clone(),
                status: p.status.clone(),
                captured_amount_cents: p.captured_amount.cents(),
            }),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

fn viewer_for(user: &CurrentUser) -> Viewer {
    if user.is_admin {
        Viewer::Admin
    } else {
        Viewer::Customer(user.user_id)
    }
}

// -- Handlers --

/// POST /orders: Reserve stock and create an order from the requested lines.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn create<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = OrderRequest {
        user_id: Some(user.user_id),
        lines: req.items.iter().map(OrderItemRequest::to_line).collect(),
        customer: req.customer.into(),
    };

    let order = state.workflow.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /my-orders: The caller's orders, newest first.
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_mine<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_my_orders(user.user_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: One order, if the caller owns it or is an admin.
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_order(order_id, viewer_for(&user)).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id}/receipt: Plain-text receipt.
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn receipt<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_order_id(&id)?;
    let text = state.orders.receipt(order_id, viewer_for(&user)).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    ))
}
