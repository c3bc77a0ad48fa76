//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{CheckoutError, Result};

/// Provider status meaning the funds were captured.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// What the payment provider reports after a capture call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub external_order_id: String,
    pub status: String,
    pub captured_amount: Money,
    pub currency: String,
}

impl PaymentConfirmation {
    pub fn completed(
        external_order_id: impl Into<String>,
        captured_amount: Money,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            external_order_id: external_order_id.into(),
            status: STATUS_COMPLETED.to_string(),
            captured_amount,
            currency: currency.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// External payment provider, reduced to the capture confirmation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Captures a provider-side order and reports the result.
    async fn capture(&self, external_order_id: &str) -> Result<PaymentConfirmation>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    confirmations: HashMap<String, PaymentConfirmation>,
    captures: usize,
    fail_on_capture: bool,
    capture_delay: Duration,
}

/// In-memory payment gateway for testing and local runs.
///
/// Unknown provider orders are reported as `PAYER_ACTION_REQUIRED`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the confirmation returned for a provider order.
    pub async fn register(&self, confirmation: PaymentConfirmation) {
        self.state
            .write()
            .await
            .confirmations
            .insert(confirmation.external_order_id.clone(), confirmation);
    }

    /// Configures the gateway to fail every capture call.
    pub async fn set_fail_on_capture(&self, fail: bool) {
        self.state.write().await.fail_on_capture = fail;
    }

    /// Delays every capture call before the provider answers.
    pub async fn set_capture_delay(&self, delay: Duration) {
        self.state.write().await.capture_delay = delay;
    }

    /// Returns the number of capture calls made.
    pub async fn capture_count(&self) -> usize {
        self.state.read().await.captures
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn capture(&self, external_order_id: &str) -> Result<PaymentConfirmation> {
        let delay = self.state.read().await.capture_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        state.captures += 1;

        if state.fail_on_capture {
            return Err(CheckoutError::PaymentProvider(
                "provider unavailable".to_string(),
            ));
        }

        Ok(state
            .confirmations
            .get(external_order_id)
            .cloned()
            .unwrap_or_else(|| PaymentConfirmation {
                external_order_id: external_order_id.to_string(),
                status: "PAYER_ACTION_REQUIRED".to_string(),
                captured_amount: Money::zero(),
                currency: String::new(),
            }))
    }
}
