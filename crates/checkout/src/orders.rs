//! Order queries and the fulfillment state machine service.

use std::time::Duration;

use common::{OrderId, UserId};
use domain::{FulfillmentState, Order};
use store::{OrderStore, StoreError};

use crate::config::bounded;
use crate::error::{CheckoutError, Result};
use crate::receipt::render_receipt;

/// Who is looking at an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// A signed-in customer; sees only their own orders.
    Customer(UserId),
    /// Store staff; sees every order.
    Admin,
}

impl Viewer {
    fn can_see(&self, order: &Order) -> bool {
        match self {
            Viewer::Customer(user_id) => order.is_owned_by(*user_id),
            Viewer::Admin => true,
        }
    }
}

/// Service for reading orders and advancing their fulfillment state.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    timeout: Duration,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Loads an order visible to `viewer`.
    ///
    /// Orders owned by someone else are reported as not found.
    pub async fn get_order(&self, id: OrderId, viewer: Viewer) -> Result<Order> {
        let order = bounded(self.timeout, self.store.get_order(id)).await?;
        order
            .filter(|o| viewer.can_see(o))
            .ok_or(CheckoutError::OrderNotFound(id))
    }

    /// Renders the plain-text receipt of an order visible to `viewer`.
    pub async fn receipt(&self, id: OrderId, viewer: Viewer) -> Result<String> {
        let order = self.get_order(id, viewer).await?;
        Ok(render_receipt(&order))
    }

    /// The user's orders, newest first.
    pub async fn list_my_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(bounded(self.timeout, self.store.list_orders_by_user(user_id)).await?)
    }

    /// Every order, newest first.
    pub async fn list_all_orders(&self) -> Result<Vec<Order>> {
        Ok(bounded(self.timeout, self.store.list_all_orders()).await?)
    }

    /// Moves an order one step along `pendiente → enviado → entregado`.
    ///
    /// Any other request, same-state requests included, is rejected with
    /// `InvalidTransition`. Losing a race to another writer is reported the
    /// same way, against the state that writer left behind.
    #[tracing::instrument(skip(self))]
    pub async fn set_fulfillment_state(
        &self,
        id: OrderId,
        next: FulfillmentState,
    ) -> Result<Order> {
        let current = bounded(self.timeout, self.store.get_order(id))
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?
            .fulfillment_state();

        if !current.can_transition_to(next) {
            return Err(CheckoutError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        match bounded(
            self.timeout,
            self.store.update_fulfillment_state(id, current, next),
        )
        .await
        {
            Ok(order) => {
                metrics::counter!("fulfillment_transitions_total", "to" => next.as_str())
                    .increment(1);
                tracing::info!(order_id = %id, from = %current, to = %next, "fulfillment state changed");
                Ok(order)
            }
            Err(StoreError::ConcurrencyConflict { actual, .. }) => {
                tracing::info!(order_id = %id, %actual, "fulfillment update lost a race");
                Err(CheckoutError::InvalidTransition {
                    from: actual,
                    to: next,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
