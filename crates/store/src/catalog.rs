//! Catalog port: product reads and the only sanctioned stock mutations.

use async_trait::async_trait;
use common::ProductId;
use domain::Product;

use crate::Result;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decrement {
    /// Stock was decremented; carries the product as of that same write.
    Applied(Product),
    /// Stock was left untouched because it is below the requested quantity.
    Insufficient { available: u32 },
    /// No such product.
    NotFound,
}

/// Outcome of a saturating stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drain {
    pub requested: u32,
    /// Units actually removed (`min(requested, previous stock)`).
    pub taken: u32,
    pub remaining: u32,
}

impl Drain {
    /// Units that could not be covered by stock.
    pub fn shortfall(&self) -> u32 {
        self.requested - self.taken
    }
}

/// Product catalog storage.
///
/// Implementations must make [`conditional_decrement`](Self::conditional_decrement),
/// [`drain_stock`](Self::drain_stock) and [`restore_stock`](Self::restore_stock)
/// single atomic writes: two callers can never both observe the same stock
/// and both decrement it.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Reads a product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// `stock -= quantity` only if `stock >= quantity`.
    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<Decrement>;

    /// `stock = max(stock - quantity, 0)`. Returns `None` for unknown products.
    async fn drain_stock(&self, id: &ProductId, quantity: u32) -> Result<Option<Drain>>;

    /// `stock += quantity`; the compensating action for a decrement.
    async fn restore_stock(&self, id: &ProductId, quantity: u32) -> Result<()>;

    /// Overwrites the stock level (catalog management).
    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<Product>;

    /// Inserts or replaces a product (catalog management).
    async fn upsert_product(&self, product: &Product) -> Result<()>;
}
