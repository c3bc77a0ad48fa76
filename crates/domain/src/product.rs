//! Catalog product as seen by the checkout core.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// A catalog product.
///
/// Stock is unsigned, so the non-negative invariant holds by construction;
/// stores only ever change it through their conditional primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub image: Option<String>,
    pub category: Option<String>,
}

impl Product {
    /// Creates a product, rejecting negative prices.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Result<Self, DomainError> {
        if price.is_negative() {
            return Err(DomainError::NegativePrice {
                cents: price.cents(),
            });
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            image: None,
            category: None,
        })
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the category reference.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
