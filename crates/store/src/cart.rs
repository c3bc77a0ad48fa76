//! Cart port.

use async_trait::async_trait;
use common::UserId;
use domain::{Cart, MergeToken};

use crate::Result;

/// Per-user cart storage.
///
/// Carts are replaced wholesale; concurrent writers for the same user are
/// last-write-wins.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads a user's cart. Unknown users have an empty cart.
    async fn get_cart(&self, user_id: UserId) -> Result<Cart>;

    /// Replaces a user's cart.
    async fn replace_cart(&self, user_id: UserId, cart: &Cart) -> Result<()>;

    /// Replaces a user's cart unless `token` was already consumed for that user.
    ///
    /// Recording the token and replacing the cart happen atomically. Returns
    /// `false`, leaving the cart untouched, for a replayed token.
    async fn replace_cart_once(&self, user_id: UserId, token: MergeToken, cart: &Cart)
    -> Result<bool>;
}
