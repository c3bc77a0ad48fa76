use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted length of a product identifier.
pub const PRODUCT_ID_MAX_LEN: usize = 64;

/// Unique identifier for an order.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// order IDs with user IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderId> for Uuid {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Identifier of a storefront user, as asserted by the auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Rejection produced by [`ProductId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductIdError {
    #[error("product id is empty")]
    Empty,

    #[error("product id is longer than {PRODUCT_ID_MAX_LEN} characters")]
    TooLong,

    #[error("product id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Catalog product identifier (SKU or document id).
///
/// Well-formed ids are 1 to 64 ASCII alphanumerics, `-` or `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product ID without validating it.
    ///
    /// Use [`ProductId::parse`] for anything that came from a client.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Validates and wraps a client-supplied product id.
    pub fn parse(raw: &str) -> Result<Self, ProductIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProductIdError::Empty);
        }
        if trimmed.len() > PRODUCT_ID_MAX_LEN {
            return Err(ProductIdError::TooLong);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ProductIdError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn user_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn order_id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&OrderId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn product_id_from_owned_string() {
        let raw: String = "SKU-002".to_string();
        let id = ProductId::from(raw);
        assert_eq!(id, ProductId::from("SKU-002"));
    }

    #[test]
    fn product_id_parse_accepts_sku_and_object_ids() {
        assert_eq!(ProductId::parse("SKU-001").unwrap().as_str(), "SKU-001");
        assert_eq!(
            ProductId::parse("64f1c2a9e4b0a1b2c3d4e5f6").unwrap().as_str(),
            "64f1c2a9e4b0a1b2c3d4e5f6"
        );
        assert_eq!(ProductId::parse("  p_1 ").unwrap().as_str(), "p_1");
    }

    #[test]
    fn product_id_parse_rejects_malformed_ids() {
        assert_eq!(ProductId::parse("   "), Err(ProductIdError::Empty));
        assert_eq!(
            ProductId::parse(&"a".repeat(PRODUCT_ID_MAX_LEN + 1)),
            Err(ProductIdError::TooLong)
        );
        assert_eq!(
            ProductId::parse("p1; drop"),
            Err(ProductIdError::InvalidCharacter(';'))
        );
    }
}
