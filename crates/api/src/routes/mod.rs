//! HTTP route handlers.

pub mod admin;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use common::{OrderId, ProductId};

use crate::error::ApiError;

pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(OrderId::from_uuid)
        .map_err(|_| ApiError::NotFound(format!("Order not found: {raw}")))
}

pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    ProductId::parse(raw).map_err(|e| ApiError::BadRequest(format!("Invalid product id: {e}")))
}
