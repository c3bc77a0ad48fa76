//! Cart endpoints, including the merge used when a session resumes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Cart, CartLine, MergeToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::StorefrontStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{CurrentUser, ValidJson};
use crate::routes::orders::normalize_quantity;
use crate::routes::parse_product_id;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub quantity: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub lines: Vec<CartLineRequest>,
    pub merge_token: Option<uuid::Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_quantity: u64,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    #[serde(flatten)]
    pub cart: CartResponse,
    pub applied: bool,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        let items: Vec<CartItemResponse> = cart
            .lines()
            .map(|line| CartItemResponse {
                product_id: line.product_id.to_string(),
                quantity: line.quantity,
            })
            .collect();
        let total_quantity = items.iter().map(|item| u64::from(item.quantity)).sum();
        Self {
            items,
            total_quantity,
        }
    }
}

fn to_quantity(raw: i64) -> Result<u32, ApiError> {
    u32::try_from(raw).map_err(|_| ApiError::BadRequest(format!("Quantity out of range: {raw}")))
}

/// Client lines with a quantity below 1 are skipped.
fn client_lines(lines: &[CartLineRequest]) -> Result<Vec<CartLine>, ApiError> {
    lines
        .iter()
        .filter(|line| line.quantity >= 1)
        .map(|line| {
            Ok(CartLine {
                product_id: parse_product_id(&line.product_id)?,
                quantity: to_quantity(line.quantity)?,
            })
        })
        .collect()
}

// -- Handlers --

/// GET /cart
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(user.user_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart: Add units of a product.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn add<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&req.product_id)?;
    let quantity = to_quantity(normalize_quantity(req.quantity.as_ref()))?;
    let cart = state
        .carts
        .add_item(user.user_id, product_id, quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /cart/{product_id}: Set a line's quantity; below 1 removes it.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn update<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    ValidJson(req): ValidJson<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state
        .carts
        .update_item(user.user_id, product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart/{product_id}
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn remove<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state.carts.remove_item(user.user_id, &product_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn clear<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.carts.clear(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cart/merge: Fold a client-held cart into the stored one.
#[tracing::instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn merge<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<MergeRequest>,
) -> Result<Json<MergeResponse>, ApiError> {
    let lines = client_lines(&req.lines)?;
    let token = req.merge_token.map(MergeToken::from_uuid);

    let outcome = state.carts.merge(user.user_id, &lines, token).await?;

    Ok(Json(MergeResponse {
        cart: CartResponse::from(&outcome.cart),
        applied: outcome.applied,
    }))
}
