//! Order creation workflow.
//!
//! Local checkout runs `Validating → Reserving → Pricing → Persisting →
//! ClearingCart → Notifying → Done`. Every failure before the order is
//! written releases the reservation; nothing after the write can undo it.
//!
//! The capture path records orders for payments an external provider has
//! already captured. The order is the commit point there too, and stock is
//! drained best-effort afterwards.

use std::sync::Arc;

use common::UserId;
use domain::{Cart, CartLine, CustomerInfo, ExternalPayment, Order, OrderDraft, ProductId};
use serde::{Deserialize, Serialize};
use store::{StoreError, StorefrontStore};

use crate::config::{CheckoutConfig, bounded};
use crate::error::{CheckoutError, Result};
use crate::reservation::{Reservation, ReservationEngine};
use crate::run::WorkflowRun;
use crate::services::{NotificationSink, PaymentConfirmation, PaymentGateway};

/// One requested line, as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Input of a local checkout.
///
/// There is deliberately no price field anywhere in it.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub user_id: Option<UserId>,
    pub lines: Vec<LineRequest>,
    pub customer: CustomerInfo,
}

/// Input of the capture path. Blank customer fields get placeholders.
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub user_id: Option<UserId>,
    pub lines: Vec<LineRequest>,
    pub customer: CustomerInfo,
}

/// Checks the request lines and coalesces duplicate products.
///
/// Returns lines sorted by product id with strictly positive quantities.
pub fn validate_lines(lines: &[LineRequest]) -> Result<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "order must contain at least one line".to_string(),
        ));
    }

    let mut parsed = Vec::with_capacity(lines.len());
    for line in lines {
        let product_id = ProductId::parse(&line.product_id).map_err(|e| {
            CheckoutError::InvalidRequest(format!("invalid product id {:?}: {e}", line.product_id))
        })?;
        let quantity = u32::try_from(line.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                CheckoutError::InvalidRequest(format!(
                    "quantity for {product_id} must be between 1 and {}",
                    u32::MAX
                ))
            })?;
        parsed.push(CartLine {
            product_id,
            quantity,
        });
    }

    Ok(Cart::from_lines(parsed).lines().collect())
}

/// Orchestrates order creation against a storefront store.
pub struct OrderWorkflow<S> {
    store: S,
    reservations: ReservationEngine<S>,
    notifier: Arc<dyn NotificationSink>,
    payments: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
}

impl<S: StorefrontStore> OrderWorkflow<S> {
    pub fn new(
        store: S,
        notifier: Arc<dyn NotificationSink>,
        payments: Arc<dyn PaymentGateway>,
        config: CheckoutConfig,
    ) -> Self {
        let reservations = ReservationEngine::new(store.clone(), config.store_timeout);
        Self {
            store,
            reservations,
            notifier,
            payments,
            config,
        }
    }

    /// Creates an order from client lines and returns it.
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order> {
        self.run_create_order(request).await.1
    }

    /// Creates an order and also returns the record of the stages it went through.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = ?request.user_id, lines = request.lines.len())
    )]
    pub async fn run_create_order(&self, request: OrderRequest) -> (WorkflowRun, Result<Order>) {
        metrics::counter!("checkout_attempts_total").increment(1);
        let mut run = WorkflowRun::start();

        let result = self.drive(&mut run, request).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total", "source" => "checkout").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.total(),
                    duration = run.elapsed_secs(),
                    "order created"
                );
            }
            Err(e) => {
                let stage = run.failed_at().map_or("unknown", |s| s.as_str());
                metrics::counter!("checkout_failures_total", "stage" => stage, "code" => e.code())
                    .increment(1);
                tracing::warn!(stage, error = %e, "order creation failed");
            }
        }
        metrics::histogram!("checkout_duration_seconds").record(run.elapsed_secs());

        (run, result)
    }

    async fn drive(&self, run: &mut WorkflowRun, request: OrderRequest) -> Result<Order> {
        let lines = validate_lines(&request.lines).map_err(|e| fail(run, e))?;

        run.advance(); // Reserving
        let reservation = self
            .reservations
            .reserve(&lines)
            .await
            .map_err(|e| fail(run, e))?;

        run.advance(); // Pricing
        let order = match OrderDraft::new(request.customer, self.config.currency.as_str())
            .for_user(request.user_id)
            .build(reservation.priced_lines())
        {
            Ok(order) => order,
            Err(e) => return Err(self.abort(run, &reservation, e.into()).await),
        };

        run.advance(); // Persisting
        if let Err(e) = self.persist(&order).await {
            return Err(self.abort(run, &reservation, CheckoutError::Persistence(e)).await);
        }
        run.record_order(order.id());

        run.advance(); // ClearingCart
        if let Some(user_id) = order.user_id()
            && let Err(e) = self.clear_cart(user_id).await
        {
            run.warn(format!("cart not cleared: {e}"));
        }

        run.advance(); // Notifying
        self.dispatch_notification(&order);

        run.advance(); // Done
        Ok(order)
    }

    /// Writes the order. A timed-out write is looked up once before it is
    /// reported as failed, since the insert may have landed anyway.
    async fn persist(&self, order: &Order) -> std::result::Result<(), StoreError> {
        let timeout = self.config.store_timeout;
        match bounded(timeout, self.store.create_order(order)).await {
            Err(StoreError::Timeout) => {
                match bounded(timeout, self.store.get_order(order.id())).await {
                    Ok(Some(_)) => {
                        tracing::warn!(order_id = %order.id(), "order write timed out but was stored");
                        Ok(())
                    }
                    _ => Err(StoreError::Timeout),
                }
            }
            other => other,
        }
    }

    async fn abort(
        &self,
        run: &mut WorkflowRun,
        reservation: &Reservation,
        error: CheckoutError,
    ) -> CheckoutError {
        let release = self.reservations.release(reservation).await;
        if !release.is_complete() {
            run.warn(format!(
                "stock not restored for {} line(s)",
                release.failed.len()
            ));
        }
        fail(run, error)
    }

    async fn clear_cart(&self, user_id: UserId) -> std::result::Result<(), StoreError> {
        let result = bounded(
            self.config.store_timeout,
            self.store.replace_cart(user_id, &Cart::new()),
        )
        .await;
        if let Err(e) = &result {
            metrics::counter!("cart_clear_failures_total").increment(1);
            tracing::warn!(%user_id, error = %e, "failed to clear cart after order");
        }
        result
    }

    fn dispatch_notification(&self, order: &Order) {
        let sink = Arc::clone(&self.notifier);
        let order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.notify(&order).await {
                metrics::counter!("notification_failures_total").increment(1);
                tracing::warn!(order_id = %order.id(), error = %e, "order notification failed");
            }
        });
    }

    /// Records an order for a payment captured by the external provider.
    ///
    /// Lines are priced from the catalog before the provider is called, so an
    /// unknown product fails with no money moved. A second capture for the
    /// same provider order returns the order recorded the first time and
    /// leaves stock alone. When the order write fails after a completed
    /// capture the error is retryable; the retry asks the provider again and
    /// records the order once it re-reports the capture as completed.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn capture_external_payment(
        &self,
        external_order_id: &str,
        request: CaptureRequest,
    ) -> Result<Order> {
        let timeout = self.config.store_timeout;
        let external_order_id = external_order_id.trim();
        if external_order_id.is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "external order id is required".to_string(),
            ));
        }

        if let Some(existing) = self.recorded_capture(external_order_id).await? {
            return Ok(existing);
        }

        let lines = validate_lines(&request.lines)?;

        // Every line is priced before the provider is asked to move money.
        let mut products = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = bounded(timeout, self.store.get_product(&line.product_id))
                .await
                .map_err(CheckoutError::Persistence)?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;
            products.push((product, line.quantity));
        }

        let confirmation = self.capture_with_provider(external_order_id).await?;
        if !confirmation.is_completed() {
            metrics::counter!("capture_rejections_total").increment(1);
            return Err(CheckoutError::PaymentNotCompleted {
                status: confirmation.status,
            });
        }

        let currency = if confirmation.currency.is_empty() {
            self.config.currency.clone()
        } else {
            confirmation.currency.clone()
        };
        let order = OrderDraft::new(request.customer.with_placeholders(), currency)
            .for_user(request.user_id)
            .with_payment(ExternalPayment {
                external_id: external_order_id.to_string(),
                status: confirmation.status.clone(),
                captured_amount: confirmation.captured_amount,
            })
            .build(products.iter().map(|(product, quantity)| (product, *quantity)))?;

        if order.total() != confirmation.captured_amount {
            metrics::counter!("capture_amount_mismatches_total").increment(1);
            tracing::warn!(
                external_order_id,
                computed = %order.total(),
                captured = %confirmation.captured_amount,
                "captured amount differs from catalog total"
            );
        }

        match self.persist(&order).await {
            Ok(()) => {}
            Err(StoreError::DuplicateExternalPayment(_)) => {
                // Lost a race with a concurrent capture of the same payment.
                return self
                    .recorded_capture(external_order_id)
                    .await?
                    .ok_or(CheckoutError::Persistence(StoreError::DuplicateExternalPayment(
                        external_order_id.to_string(),
                    )));
            }
            Err(e) => return Err(CheckoutError::Persistence(e)),
        }

        for line in &lines {
            self.drain_line(line).await;
        }

        if let Some(user_id) = order.user_id()
            && let Err(e) = self.clear_cart(user_id).await
        {
            tracing::debug!(%user_id, error = %e, "cart kept after captured order");
        }
        self.dispatch_notification(&order);

        metrics::counter!("orders_created_total", "source" => "capture").increment(1);
        tracing::info!(order_id = %order.id(), external_order_id, "captured order recorded");
        Ok(order)
    }

    /// Asks the provider to capture, under the same deadline as store calls.
    async fn capture_with_provider(
        &self,
        external_order_id: &str,
    ) -> Result<PaymentConfirmation> {
        match tokio::time::timeout(
            self.config.store_timeout,
            self.payments.capture(external_order_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("payment_provider_timeouts_total").increment(1);
                tracing::warn!(external_order_id, "payment provider timed out");
                Err(CheckoutError::PaymentProvider(
                    "payment provider timed out".to_string(),
                ))
            }
        }
    }

    async fn recorded_capture(&self, external_order_id: &str) -> Result<Option<Order>> {
        let existing = bounded(
            self.config.store_timeout,
            self.store.find_by_external_payment_id(external_order_id),
        )
        .await
        .map_err(CheckoutError::Persistence)?;

        if let Some(order) = &existing {
            metrics::counter!("capture_replays_total").increment(1);
            tracing::info!(order_id = %order.id(), external_order_id, "capture already recorded");
        }
        Ok(existing)
    }

    async fn drain_line(&self, line: &CartLine) {
        match bounded(
            self.config.store_timeout,
            self.store.drain_stock(&line.product_id, line.quantity),
        )
        .await
        {
            Ok(Some(drain)) if drain.shortfall() > 0 => {
                metrics::counter!("capture_stock_shortfalls_total").increment(1);
                tracing::warn!(
                    product_id = %line.product_id,
                    requested = drain.requested,
                    taken = drain.taken,
                    "captured order exceeds stock; clamped at zero"
                );
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(product_id = %line.product_id, "product vanished before stock drain");
            }
            Err(e) => {
                tracing::warn!(product_id = %line.product_id, error = %e, "stock drain failed");
            }
        }
    }
}

fn fail(run: &mut WorkflowRun, error: CheckoutError) -> CheckoutError {
    run.fail(error.to_string());
    error
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::services::{InMemoryPaymentGateway, PaymentConfirmation, RecordingNotificationSink};
    use crate::state::WorkflowStage;
    use domain::{Money, Product};
    use store::{CartStore, InMemoryStore, OrderStore};

    struct Harness {
        workflow: OrderWorkflow<InMemoryStore>,
        store: InMemoryStore,
        sink: RecordingNotificationSink,
        gateway: InMemoryPaymentGateway,
    }

    async fn harness() -> Harness {
        let store = InMemoryStore::with_products([
            Product::new("P1", "Mug", Money::from_units(10), 5).unwrap(),
            Product::new("P2", "Poster", Money::from_cents(1250), 2).unwrap(),
        ])
        .await;
        let sink = RecordingNotificationSink::new();
        let gateway = InMemoryPaymentGateway::new();
        let workflow = OrderWorkflow::new(
            store.clone(),
            Arc::new(sink.clone()),
            Arc::new(gateway.clone()),
            CheckoutConfig::new(Duration::from_millis(200), "USD"),
        );
        Harness {
            workflow,
            store,
            sink,
            gateway,
        }
    }

    fn request(user_id: Option<UserId>, lines: &[(&str, i64)]) -> OrderRequest {
        OrderRequest {
            user_id,
            lines: lines.iter().map(|(id, q)| LineRequest::new(*id, *q)).collect(),
            customer: CustomerInfo::new("Calle 1", "Lima", "15001"),
        }
    }

    #[test]
    fn test_validate_lines_coalesces_duplicates() {
        let lines = validate_lines(&[
            LineRequest::new("B", 1),
            LineRequest::new(" A ", 2),
            LineRequest::new("B", 3),
        ])
        .unwrap();
        assert_eq!(
            lines,
            vec![CartLine::new("A", 2).unwrap(), CartLine::new("B", 4).unwrap()]
        );
    }

    #[test]
    fn test_validate_lines_rejects_bad_input() {
        assert!(validate_lines(&[]).is_err());
        assert!(validate_lines(&[LineRequest::new("A", 0)]).is_err());
        assert!(validate_lines(&[LineRequest::new("A", -3)]).is_err());
        assert!(validate_lines(&[LineRequest::new("not valid!", 1)]).is_err());
        assert!(validate_lines(&[LineRequest::new("A", i64::from(u32::MAX) + 1)]).is_err());
    }

    #[tokio::test]
    async fn test_happy_path() {
        let h = harness().await;
        let user = UserId::new();
        h.store
            .replace_cart(user, &Cart::from_lines([CartLine::new("P1", 3).unwrap()]))
            .await
            .unwrap();

        let (run, result) = h
            .workflow
            .run_create_order(request(Some(user), &[("P1", 3)]))
            .await;
        let order = result.unwrap();

        assert_eq!(run.stage(), WorkflowStage::Done);
        assert_eq!(run.history().len(), 7);
        assert_eq!(run.order_id(), Some(order.id()));
        assert_eq!(order.total(), Money::from_units(30));
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(2));
        assert!(h.store.get_cart(user).await.unwrap().is_empty());
        assert!(h.sink.wait_for(1, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_insufficient_stock_fails_in_reserving() {
        let h = harness().await;
        let (run, result) = h
            .workflow
            .run_create_order(request(None, &[("P1", 1), ("P2", 3)]))
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(run.failed_at(), Some(WorkflowStage::Reserving));
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_customer_releases_reservation() {
        let h = harness().await;
        let mut req = request(None, &[("P1", 2)]);
        req.customer.postal_code = "  ".to_string();

        let (run, result) = h.workflow.run_create_order(req).await;
        assert!(matches!(
            result,
            Err(CheckoutError::InvalidCustomerInfo {
                field: "postal_code"
            })
        ));
        assert_eq!(run.failed_at(), Some(WorkflowStage::Pricing));
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
    }

    #[tokio::test]
    async fn test_persistence_failure_releases_reservation() {
        let h = harness().await;
        h.store.set_fail_on_create_order(true);

        let (run, result) = h
            .workflow
            .run_create_order(request(None, &[("P1", 2), ("P2", 1)]))
            .await;

        assert!(matches!(result, Err(CheckoutError::Persistence(_))));
        assert_eq!(run.failed_at(), Some(WorkflowStage::Persisting));
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
        assert_eq!(h.store.stock_of(&"P2".into()).await, Some(2));
    }

    #[tokio::test]
    async fn test_persistence_timeout_releases_reservation() {
        let h = harness().await;
        h.store.set_create_order_delay(Duration::from_secs(2));

        let (run, result) = h
            .workflow
            .run_create_order(request(None, &[("P1", 2)]))
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Persistence(StoreError::Timeout))
        ));
        assert_eq!(run.failed_at(), Some(WorkflowStage::Persisting));
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_cart_clear_failure_keeps_order() {
        let h = harness().await;
        h.store.set_fail_on_replace_cart(true);

        let (run, result) = h
            .workflow
            .run_create_order(request(Some(UserId::new()), &[("P1", 1)]))
            .await;

        assert!(result.is_ok());
        assert_eq!(run.stage(), WorkflowStage::Done);
        assert_eq!(run.warnings().len(), 1);
        assert_eq!(h.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_order() {
        let h = harness().await;
        h.sink.set_fail(true);

        let order = h
            .workflow
            .create_order(request(None, &[("P1", 1)]))
            .await
            .unwrap();
        assert!(h.store.get_order(order.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_capture_records_order_and_drains_stock() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-1",
                Money::from_units(30),
                "USD",
            ))
            .await;

        let order = h
            .workflow
            .capture_external_payment(
                "PAY-1",
                CaptureRequest {
                    lines: vec![LineRequest::new("P1", 3)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(order.external_payment_id(), Some("PAY-1"));
        assert_eq!(order.payment_status(), Some("COMPLETED"));
        assert_eq!(order.customer().postal_code, "00000");
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(2));
    }

    #[tokio::test]
    async fn test_capture_clamps_stock_at_zero() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-2",
                Money::from_cents(1250 * 4),
                "USD",
            ))
            .await;

        let order = h
            .workflow
            .capture_external_payment(
                "PAY-2",
                CaptureRequest {
                    lines: vec![LineRequest::new("P2", 4)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(order.total_quantity(), 4);
        assert_eq!(h.store.stock_of(&"P2".into()).await, Some(0));
    }

    #[tokio::test]
    async fn test_capture_is_idempotent() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-3",
                Money::from_units(10),
                "USD",
            ))
            .await;
        let capture = || CaptureRequest {
            lines: vec![LineRequest::new("P1", 1)],
            ..Default::default()
        };

        let first = h
            .workflow
            .capture_external_payment("PAY-3", capture())
            .await
            .unwrap();
        let second = h
            .workflow
            .capture_external_payment("PAY-3", capture())
            .await
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(4));
        assert_eq!(h.gateway.capture_count().await, 1);
    }

    #[tokio::test]
    async fn test_capture_requires_completed_payment() {
        let h = harness().await;
        let result = h
            .workflow
            .capture_external_payment(
                "PAY-UNKNOWN",
                CaptureRequest {
                    lines: vec![LineRequest::new("P1", 1)],
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::PaymentNotCompleted { .. })
        ));
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
    }

    #[tokio::test]
    async fn test_capture_unknown_product_records_nothing() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-4",
                Money::from_units(10),
                "USD",
            ))
            .await;

        let result = h
            .workflow
            .capture_external_payment(
                "PAY-4",
                CaptureRequest {
                    lines: vec![LineRequest::new("GHOST", 1)],
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::ProductNotFound(_))));
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.gateway.capture_count().await, 0);
    }

    #[tokio::test]
    async fn test_capture_retry_with_unknown_product_never_charges() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-9",
                Money::from_units(10),
                "USD",
            ))
            .await;

        for _ in 0..2 {
            let result = h
                .workflow
                .capture_external_payment(
                    "PAY-9",
                    CaptureRequest {
                        lines: vec![LineRequest::new("P1", 1), LineRequest::new("GHOST", 1)],
                        ..Default::default()
                    },
                )
                .await;
            assert!(matches!(result, Err(CheckoutError::ProductNotFound(_))));
        }

        assert_eq!(h.gateway.capture_count().await, 0);
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
    }

    #[tokio::test]
    async fn test_capture_write_failure_is_retryable() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-6",
                Money::from_units(20),
                "USD",
            ))
            .await;
        let request = || CaptureRequest {
            lines: vec![LineRequest::new("P1", 2)],
            ..Default::default()
        };

        h.store.set_fail_on_create_order(true);
        let err = h
            .workflow
            .capture_external_payment("PAY-6", request())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Persistence(_)));
        assert!(err.is_retryable());
        assert_eq!(h.gateway.capture_count().await, 1);
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));

        h.store.set_fail_on_create_order(false);
        let order = h
            .workflow
            .capture_external_payment("PAY-6", request())
            .await
            .unwrap();

        assert_eq!(order.external_payment_id(), Some("PAY-6"));
        assert_eq!(h.gateway.capture_count().await, 2);
        assert_eq!(h.store.order_count().await, 1);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(3));

        // Once recorded, the provider is not asked again.
        let replay = h
            .workflow
            .capture_external_payment("PAY-6", request())
            .await
            .unwrap();
        assert_eq!(replay.id(), order.id());
        assert_eq!(h.gateway.capture_count().await, 2);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(3));
    }

    #[tokio::test]
    async fn test_capture_provider_timeout() {
        let h = harness().await;
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-7",
                Money::from_units(10),
                "USD",
            ))
            .await;
        h.gateway.set_capture_delay(Duration::from_secs(5)).await;

        let err = h
            .workflow
            .capture_external_payment(
                "PAY-7",
                CaptureRequest {
                    lines: vec![LineRequest::new("P1", 1)],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentProvider(_)));
        assert!(err.is_retryable());
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.store.stock_of(&"P1".into()).await, Some(5));
    }

    #[tokio::test]
    async fn test_capture_survives_cart_clear_failure() {
        let h = harness().await;
        let user = UserId::new();
        let cart = Cart::from_lines([CartLine::new("P2", 1).unwrap()]);
        h.store.replace_cart(user, &cart).await.unwrap();
        h.gateway
            .register(PaymentConfirmation::completed(
                "PAY-8",
                Money::from_cents(1250),
                "USD",
            ))
            .await;

        h.store.set_fail_on_replace_cart(true);
        let order = h
            .workflow
            .capture_external_payment(
                "PAY-8",
                CaptureRequest {
                    user_id: Some(user),
                    lines: vec![LineRequest::new("P2", 1)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(order.user_id(), Some(user));
        assert_eq!(h.store.stock_of(&"P2".into()).await, Some(1));
        assert_eq!(h.store.get_cart(user).await.unwrap(), cart);
    }
}
