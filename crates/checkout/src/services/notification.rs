//! Notification sink trait and implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

use crate::receipt::render_receipt;

/// A notification could not be delivered. Never fails an order.
#[derive(Debug, Error)]
#[error("Notification failed for order {order_id}: {reason}")]
pub struct NotificationError {
    pub order_id: OrderId,
    pub reason: String,
}

/// Best-effort order confirmation channel (receipt mail, webhook, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError>;
}

/// Sink that writes the rendered receipt to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError> {
        let receipt = render_receipt(order);
        tracing::info!(
            order_id = %order.id(),
            email = order.customer().email.as_deref().unwrap_or("-"),
            total = %order.total(),
            "order confirmation\n{receipt}"
        );
        Ok(())
    }
}

/// Sink that remembers which orders it was asked about.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    delivered: Arc<Mutex<Vec<OrderId>>>,
    attempts: Arc<Notify>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent notification fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Orders notified successfully, in delivery order.
    pub async fn delivered(&self) -> Vec<OrderId> {
        self.delivered.lock().await.clone()
    }

    /// Waits until at least `count` notifications were delivered.
    ///
    /// Returns false if that did not happen within `timeout`.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.attempts.notified();
                if self.delivered.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            self.attempts.notify_waiters();
            return Err(NotificationError {
                order_id: order.id(),
                reason: "sink unavailable".to_string(),
            });
        }
        self.delivered.lock().await.push(order.id());
        self.attempts.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CustomerInfo, Money, OrderDraft, Product};

    fn order() -> Order {
        let mug = Product::new("P1", "Mug", Money::from_units(10), 5).unwrap();
        OrderDraft::new(CustomerInfo::new("Calle 1", "Lima", "15001"), "USD")
            .build([(&mug, 1)])
            .unwrap()
    }

    #[tokio::test]
    async fn test_recording_sink_records() {
        let sink = RecordingNotificationSink::new();
        let order = order();
        sink.notify(&order).await.unwrap();
        assert_eq!(sink.delivered().await, vec![order.id()]);
        assert!(sink.wait_for(1, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_recording_sink_failure() {
        let sink = RecordingNotificationSink::new();
        sink.set_fail(true);
        assert!(sink.notify(&order()).await.is_err());
        assert!(sink.delivered().await.is_empty());
        assert!(!sink.wait_for(1, Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_log_sink_never_fails() {
        assert!(LogNotificationSink.notify(&order()).await.is_ok());
    }
}
