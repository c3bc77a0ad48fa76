use common::{OrderId, ProductId};
use domain::FulfillmentState;
use thiserror::Error;

/// Errors that can occur when interacting with a storefront store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A compare-and-set on the fulfillment state lost against another writer.
    #[error(
        "Concurrency conflict for order {order_id}: expected state {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: FulfillmentState,
        actual: FulfillmentState,
    },

    /// An order for this external payment has already been recorded.
    #[error("Order already recorded for external payment {0}")]
    DuplicateExternalPayment(String),

    /// The store did not answer in time.
    #[error("Store operation timed out")]
    Timeout,

    /// The store refused the operation (used by fault injection).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be mapped back into the domain.
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
