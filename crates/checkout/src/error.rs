//! Checkout error types.

use common::{OrderId, ProductId};
use domain::{CartError, FulfillmentState, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout services.
///
/// Business rejections carry the offending product or field. Infrastructure
/// failures are folded into [`CheckoutError::Persistence`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Malformed request; never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    #[error("Invalid customer info: {field} is required")]
    InvalidCustomerInfo { field: &'static str },

    /// The external payment was not captured.
    #[error("Payment not completed: status {status}")]
    PaymentNotCompleted { status: String },

    /// The payment provider could not be reached or refused the capture call.
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Invalid fulfillment transition: {from} -> {to}")]
    InvalidTransition {
        from: FulfillmentState,
        to: FulfillmentState,
    },

    #[error("Product {0} is not in the cart")]
    CartLineNotFound(ProductId),

    /// Transient storage failure; the operation was rolled back and may be retried.
    #[error("Persistence error: {0}")]
    Persistence(StoreError),
}

impl CheckoutError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::InvalidRequest(_) => "INVALID_REQUEST",
            CheckoutError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CheckoutError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CheckoutError::InvalidCustomerInfo { .. } => "INVALID_CUSTOMER_INFO",
            CheckoutError::PaymentNotCompleted { .. } => "PAYMENT_NOT_COMPLETED",
            CheckoutError::PaymentProvider(_) => "PAYMENT_PROVIDER_ERROR",
            CheckoutError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CheckoutError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CheckoutError::CartLineNotFound(_) => "CART_LINE_NOT_FOUND",
            CheckoutError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Persistence(_) | CheckoutError::PaymentProvider(_)
        )
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            StoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            other => CheckoutError::Persistence(other),
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidCustomerInfo { field } => {
                CheckoutError::InvalidCustomerInfo { field }
            }
            OrderError::InvalidTransition { from, to } => {
                CheckoutError::InvalidTransition { from, to }
            }
            other @ (OrderError::NoLines | OrderError::InvalidQuantity { .. }) => {
                CheckoutError::InvalidRequest(other.to_string())
            }
        }
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::LineNotFound { product_id } => CheckoutError::CartLineNotFound(product_id),
            other @ CartError::InvalidQuantity { .. } => {
                CheckoutError::InvalidRequest(other.to_string())
            }
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
