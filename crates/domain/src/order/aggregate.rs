//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{CustomerInfo, FulfillmentState, OrderError, OrderLine};
use crate::money::Money;

/// Payment details reported by an external provider for captured orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPayment {
    /// The provider's order/capture identifier.
    pub external_id: String,
    /// Provider-reported status, free text (e.g. `COMPLETED`).
    pub status: String,
    /// Amount the provider reports as captured.
    pub captured_amount: Money,
}

/// Order aggregate root.
///
/// Everything except the fulfillment state is fixed at creation; the only
/// way to build one is [`OrderDraft::build`](super::OrderDraft::build),
/// which prices the lines from catalog snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,

    /// Owner, absent for guest or provider-initiated orders.
    user_id: Option<UserId>,

    payment: Option<ExternalPayment>,

    lines: Vec<OrderLine>,

    /// Σ unit price × quantity over `lines`.
    total: Money,

    currency: String,

    customer: CustomerInfo,

    created_at: DateTime<Utc>,

    fulfillment_state: FulfillmentState,
}

impl Order {
    pub(super) fn new(
        user_id: Option<UserId>,
        payment: Option<ExternalPayment>,
        lines: Vec<OrderLine>,
        currency: String,
        customer: CustomerInfo,
    ) -> Self {
        let total = lines.iter().map(OrderLine::line_total).sum();
        Self {
            id: OrderId::new(),
            user_id,
            payment,
            lines,
            total,
            currency,
            customer,
            created_at: Utc::now(),
            fulfillment_state: FulfillmentState::Pending,
        }
    }

    /// Advances the fulfillment state along the transition table.
    pub fn advance_fulfillment(&mut self, next: FulfillmentState) -> Result<(), OrderError> {
        if !self.fulfillment_state.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.fulfillment_state,
                to: next,
            });
        }
        self.fulfillment_state = next;
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns true if the order belongs to the given user.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    pub fn payment(&self) -> Option<&ExternalPayment> {
        self.payment.as_ref()
    }

    pub fn external_payment_id(&self) -> Option<&str> {
        self.payment.as_ref().map(|p| p.external_id.as_str())
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.payment.as_ref().map(|p| p.status.as_str())
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn fulfillment_state(&self) -> FulfillmentState {
        self.fulfillment_state
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Product;
    use crate::order::OrderDraft;

    fn order() -> Order {
        let mug = Product::new("P1", "Mug", Money::from_units(10), 5).unwrap();
        OrderDraft::new(CustomerInfo::new("Calle 1", "Lima", "15001"), "USD")
            .build([(&mug, 3)])
            .unwrap()
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = order();
        assert_eq!(order.fulfillment_state(), FulfillmentState::Pending);
        assert_eq!(order.total(), Money::from_units(30));
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_advance_forward() {
        let mut order = order();
        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        order.advance_fulfillment(FulfillmentState::Delivered).unwrap();
        assert_eq!(order.fulfillment_state(), FulfillmentState::Delivered);
    }

    #[test]
    fn test_advance_rejects_skips_and_backward_moves() {
        let mut order = order();
        let err = order
            .advance_fulfillment(FulfillmentState::Delivered)
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: FulfillmentState::Pending,
                to: FulfillmentState::Delivered
            }
        ));

        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        assert!(
            order
                .advance_fulfillment(FulfillmentState::Pending)
                .is_err()
        );
        assert!(
            order
                .advance_fulfillment(FulfillmentState::Shipped)
                .is_err()
        );
    }

    #[test]
    fn test_advance_keeps_lines_and_total() {
        let mut order = order();
        let lines = order.lines().to_vec();
        let total = order.total();
        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        assert_eq!(order.lines(), lines.as_slice());
        assert_eq!(order.total(), total);
    }

    #[test]
    fn test_document_roundtrip_keeps_state() {
        let mut order = order();
        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["fulfillment_state"], "enviado");
        let restored: Order = serde_json::from_value(json).unwrap();
        assert_eq!(restored, order);
    }
}
