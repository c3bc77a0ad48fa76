//! Cart service: per-user cart edits and the session-resume merge.

use std::time::Duration;

use common::{ProductId, UserId};
use domain::{Cart, CartLine, MergeToken};
use store::{CartStore, CatalogStore};

use crate::config::bounded;
use crate::error::{CheckoutError, Result};

/// Result of a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub cart: Cart,
    /// False when the merge token had already been consumed.
    pub applied: bool,
}

/// Service for cart operations.
///
/// Every edit is read-modify-replace on the whole cart; concurrent edits of
/// the same user's cart are last-write-wins.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
    timeout: Duration,
}

impl<S: CartStore + CatalogStore> CartService<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart> {
        Ok(bounded(self.timeout, self.store.get_cart(user_id)).await?)
    }

    /// Adds units of a catalog product, creating the line if needed.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if bounded(self.timeout, self.store.get_product(&product_id))
            .await?
            .is_none()
        {
            return Err(CheckoutError::ProductNotFound(product_id));
        }

        let mut cart = self.get_cart(user_id).await?;
        cart.add(product_id, quantity)?;
        self.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Sets a line's quantity. Anything below 1 removes the line.
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart> {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        let mut cart = self.get_cart(user_id).await?;
        cart.set_quantity(&product_id, quantity)?;
        self.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Removes a line; removing an absent product is a no-op.
    pub async fn remove_item(&self, user_id: UserId, product_id: &ProductId) -> Result<Cart> {
        let mut cart = self.get_cart(user_id).await?;
        if cart.remove(product_id) {
            self.save(user_id, &cart).await?;
        }
        Ok(cart)
    }

    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        self.save(user_id, &Cart::new()).await
    }

    /// Merges a client-held cart into the stored one.
    ///
    /// With a token, the merge is applied at most once per user: replaying
    /// the token returns the stored cart untouched.
    #[tracing::instrument(skip(self, client_lines), fields(lines = client_lines.len()))]
    pub async fn merge(
        &self,
        user_id: UserId,
        client_lines: &[CartLine],
        token: Option<MergeToken>,
    ) -> Result<MergeOutcome> {
        let server = self.get_cart(user_id).await?;
        let merged = server.merge(client_lines);

        let applied = match token {
            Some(token) => {
                bounded(
                    self.timeout,
                    self.store.replace_cart_once(user_id, token, &merged),
                )
                .await?
            }
            None => {
                self.save(user_id, &merged).await?;
                true
            }
        };

        if !applied {
            metrics::counter!("cart_merges_total", "outcome" => "replayed").increment(1);
            tracing::info!(%user_id, "merge token already applied");
            return Ok(MergeOutcome {
                cart: self.get_cart(user_id).await?,
                applied,
            });
        }

        metrics::counter!("cart_merges_total", "outcome" => "applied").increment(1);
        Ok(MergeOutcome {
            cart: merged,
            applied,
        })
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<()> {
        Ok(bounded(self.timeout, self.store.replace_cart(user_id, cart)).await?)
    }
}
