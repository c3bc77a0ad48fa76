//! Order aggregate and related types.

mod aggregate;
mod builder;
mod customer;
mod line;
mod state;

pub use aggregate::{ExternalPayment, Order};
pub use builder::OrderDraft;
pub use customer::CustomerInfo;
pub use line::OrderLine;
pub use state::{FulfillmentState, UnknownFulfillmentState};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A mandatory customer field is missing or blank.
    #[error("Invalid customer info: {field} is required")]
    InvalidCustomerInfo { field: &'static str },

    /// Order has no lines.
    #[error("Order has no lines")]
    NoLines,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: String },

    /// Requested fulfillment transition is not in the transition table.
    #[error("Invalid fulfillment transition: {from} -> {to}")]
    InvalidTransition {
        from: FulfillmentState,
        to: FulfillmentState,
    },
}
