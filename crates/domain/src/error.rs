//! Domain error types.

use common::ProductIdError;
use thiserror::Error;

/// Errors raised while constructing catalog-facing domain values.
///
/// Order and cart operations have their own error enums
/// ([`OrderError`](crate::OrderError), [`CartError`](crate::CartError)).
#[derive(Debug, Error)]
pub enum DomainError {
    /// A product price below zero.
    #[error("Invalid price: {cents} cents (must not be negative)")]
    NegativePrice { cents: i64 },

    /// A malformed product identifier.
    #[error("Invalid product id: {0}")]
    InvalidProductId(#[from] ProductIdError),
}
