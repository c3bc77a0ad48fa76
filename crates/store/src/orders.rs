//! Order port.

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{FulfillmentState, Order};

use crate::Result;

/// Order storage. Orders are inserted once and never deleted.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    ///
    /// Fails with `DuplicateExternalPayment` if another order already carries
    /// the same external payment id.
    async fn create_order(&self, order: &Order) -> Result<()>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    async fn find_by_external_payment_id(&self, external_id: &str) -> Result<Option<Order>>;

    /// Compare-and-set of the fulfillment state.
    ///
    /// Fails with `OrderNotFound`, or `ConcurrencyConflict` when the stored
    /// state is not `from`. The caller validates the transition itself.
    async fn update_fulfillment_state(
        &self,
        id: OrderId,
        from: FulfillmentState,
        to: FulfillmentState,
    ) -> Result<Order>;

    /// A user's orders, newest first.
    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Every order, newest first.
    async fn list_all_orders(&self) -> Result<Vec<Order>>;
}
