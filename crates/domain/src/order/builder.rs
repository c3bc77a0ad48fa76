//! Order aggregate builder.

use common::UserId;

use super::{CustomerInfo, ExternalPayment, Order, OrderError, OrderLine};
use crate::product::Product;

/// Everything an order needs besides its priced lines.
///
/// [`OrderDraft::build`] is pure: it validates, snapshots and totals, and
/// leaves persistence to the caller.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    customer: CustomerInfo,
    currency: String,
    user_id: Option<UserId>,
    payment: Option<ExternalPayment>,
}

impl OrderDraft {
    pub fn new(customer: CustomerInfo, currency: impl Into<String>) -> Self {
        Self {
            customer,
            currency: currency.into(),
            user_id: None,
            payment: None,
        }
    }

    pub fn for_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_payment(mut self, payment: ExternalPayment) -> Self {
        self.payment = Some(payment);
        self
    }

    /// Prices the order from the given product snapshots.
    ///
    /// The total is computed only from `product.price`; there is no input
    /// through which a caller could supply a price.
    pub fn build<'a>(
        self,
        lines: impl IntoIterator<Item = (&'a Product, u32)>,
    ) -> Result<Order, OrderError> {
        let customer = self.customer.validated()?;

        let lines = lines
            .into_iter()
            .map(|(product, quantity)| {
                if quantity == 0 {
                    return Err(OrderError::InvalidQuantity {
                        product_id: product.id.to_string(),
                    });
                }
                Ok(OrderLine::snapshot(product, quantity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }

        Ok(Order::new(
            self.user_id,
            self.payment,
            lines,
            self.currency,
            customer,
        ))
    }
}
