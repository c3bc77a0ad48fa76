//! Per-user shopping cart and the cart merge algorithm.

use std::collections::BTreeMap;

use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Cart lines must hold at least one unit.
    #[error("Invalid quantity for {product_id}: must be greater than 0")]
    InvalidQuantity { product_id: ProductId },

    /// The product has no line in the cart.
    #[error("Product {product_id} is not in the cart")]
    LineNotFound { product_id: ProductId },
}

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    /// Creates a cart line, rejecting zero quantities.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Result<Self, CartError> {
        let product_id = product_id.into();
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { product_id });
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

/// Client-generated marker for one local cart snapshot.
///
/// A token is merged at most once per user; replays are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeToken(Uuid);

impl MergeToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MergeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MergeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's cart: at most one line per product, order irrelevant.
///
/// Lines are kept in a `BTreeMap` so that iteration, and therefore every
/// persisted or serialized form, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from stored lines, summing duplicate products.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.accumulate(line.product_id, line.quantity);
        }
        cart
    }

    /// Adds units of a product, creating the line if needed.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { product_id });
        }
        Ok(self.accumulate(product_id, quantity))
    }

    /// Overwrites the quantity of an existing line; zero removes it.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        let Some(current) = self.lines.get_mut(product_id) else {
            return Err(CartError::LineNotFound {
                product_id: product_id.clone(),
            });
        };
        if quantity == 0 {
            self.lines.remove(product_id);
        } else {
            *current = quantity;
        }
        Ok(())
    }

    /// Removes a product's line. Returns whether a line was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        self.lines.remove(product_id).is_some()
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Reconciles a client-held cart with this (server) cart.
    ///
    /// Quantities for products present on both sides are added, never
    /// overwritten; client-only products are inserted. The result is meant
    /// to replace the stored cart wholesale.
    pub fn merge(&self, client_lines: &[CartLine]) -> Cart {
        let mut merged = self.clone();
        for line in client_lines {
            if line.quantity > 0 {
                merged.accumulate(line.product_id.clone(), line.quantity);
            }
        }
        merged
    }

    /// Returns the quantity held for a product, if any.
    pub fn quantity(&self, product_id: &ProductId) -> Option<u32> {
        self.lines.get(product_id).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates the lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = CartLine> + '_ {
        self.lines.iter().map(|(product_id, quantity)| CartLine {
            product_id: product_id.clone(),
            quantity: *quantity,
        })
    }

    fn accumulate(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        let entry = self.lines.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(quantity);
        *entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine::new(id, quantity).unwrap()
    }

    #[test]
    fn test_line_from_owned_product_id() {
        let product_id: String = "A".to_string();
        let line = CartLine::new(product_id, 2).unwrap();
        assert_eq!(line, CartLine::new("A", 2).unwrap());
    }

    #[test]
    fn test_merge_adds_quantities() {
        let server = Cart::from_lines([line("A", 3), line("B", 1)]);
        let merged = server.merge(&[line("A", 2)]);

        assert_eq!(
            merged.lines().collect::<Vec<_>>(),
            vec![line("A", 5), line("B", 1)]
        );
        // The server cart itself is untouched.
        assert_eq!(server.quantity(&"A".into()), Some(3));
    }

    #[test]
    fn test_merge_inserts_client_only_products() {
        let server = Cart::from_lines([line("A", 1)]);
        let merged = server.merge(&[line("C", 4)]);
        assert_eq!(merged.quantity(&"C".into()), Some(4));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let server = Cart::from_lines([line("A", 1)]);
        let forward = server.merge(&[line("B", 2), line("A", 1), line("B", 1)]);
        let backward = server.merge(&[line("B", 1), line("A", 1), line("B", 2)]);
        assert_eq!(forward, backward);
        assert_eq!(forward.quantity(&"B".into()), Some(3));
    }

    #[test]
    fn test_merge_into_empty_cart() {
        let merged = Cart::new().merge(&[line("A", 2)]);
        assert_eq!(merged.lines().collect::<Vec<_>>(), vec![line("A", 2)]);
    }

    #[test]
    fn test_add_accumulates() {
        let mut cart = Cart::new();
        assert_eq!(cart.add("A".into(), 1).unwrap(), 1);
        assert_eq!(cart.add("A".into(), 2).unwrap(), 3);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_zero_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add("A".into(), 0),
            Err(CartError::InvalidQuantity {
                product_id: "A".into()
            })
        );
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::from_lines([line("A", 3)]);
        cart.set_quantity(&"A".into(), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.set_quantity(&"A".into(), 2),
            Err(CartError::LineNotFound { .. })
        ));
    }

    #[test]
    fn test_from_lines_coalesces_duplicates() {
        let cart = Cart::from_lines([line("A", 1), line("A", 2)]);
        assert_eq!(cart.quantity(&"A".into()), Some(3));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::from_lines([line("A", 1), line("B", 1)]);
        assert!(cart.remove(&"A".into()));
        assert!(!cart.remove(&"A".into()));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_line_rejects_zero() {
        assert!(CartLine::new("A", 0).is_err());
    }
}
