//! Catalog administration.

use std::time::Duration;

use common::ProductId;
use domain::Product;
use store::CatalogStore;

use crate::config::bounded;
use crate::error::{CheckoutError, Result};

/// Reads products and lets staff correct stock levels.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
    timeout: Duration,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        bounded(self.timeout, self.store.get_product(id))
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(id.clone()))
    }

    /// Overwrites a product's stock level.
    #[tracing::instrument(skip(self))]
    pub async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<Product> {
        let product = bounded(self.timeout, self.store.set_stock(id, stock)).await?;
        tracing::info!(product_id = %id, stock, "stock level set");
        Ok(product)
    }

    /// Inserts or replaces a catalog entry.
    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        Ok(bounded(self.timeout, self.store.upsert_product(product)).await?)
    }
}
