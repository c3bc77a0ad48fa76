//! Stock reservation engine.

use std::time::Duration;

use common::ProductId;
use domain::{CartLine, Product};
use store::{CatalogStore, Decrement};

use crate::config::bounded;
use crate::error::{CheckoutError, Result};

/// One reserved line: the product as of the decrementing write, and the
/// quantity taken from its stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedLine {
    pub product: Product,
    pub quantity: u32,
}

/// Stock held for an order attempt, in reservation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reservation {
    lines: Vec<ReservedLine>,
}

impl Reservation {
    pub fn lines(&self) -> &[ReservedLine] {
        &self.lines
    }

    /// `(product, quantity)` pairs in the shape the order builder takes.
    pub fn priced_lines(&self) -> impl Iterator<Item = (&Product, u32)> {
        self.lines.iter().map(|l| (&l.product, l.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Outcome of releasing a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub restored: Vec<ProductId>,
    /// Lines whose stock could not be put back; logged as errors.
    pub failed: Vec<ProductId>,
}

impl Release {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validates and decrements stock for a whole order, all or nothing.
#[derive(Clone)]
pub struct ReservationEngine<C> {
    catalog: C,
    timeout: Duration,
}

impl<C: CatalogStore> ReservationEngine<C> {
    pub fn new(catalog: C, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    /// Reserves every line or none.
    ///
    /// Each line is one conditional decrement. When line N is refused, lines
    /// `0..N` are restored in reverse order before the error is returned.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn reserve(&self, lines: &[CartLine]) -> Result<Reservation> {
        if let Some(bad) = lines.iter().find(|l| l.quantity == 0) {
            return Err(CheckoutError::InvalidRequest(format!(
                "quantity for {} must be greater than 0",
                bad.product_id
            )));
        }

        let mut reservation = Reservation::default();
        for line in lines {
            let outcome = bounded(
                self.timeout,
                self.catalog
                    .conditional_decrement(&line.product_id, line.quantity),
            )
            .await;

            let failure = match outcome {
                Ok(Decrement::Applied(product)) => {
                    reservation.lines.push(ReservedLine {
                        product,
                        quantity: line.quantity,
                    });
                    continue;
                }
                Ok(Decrement::Insufficient { available }) => CheckoutError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available,
                    requested: line.quantity,
                },
                Ok(Decrement::NotFound) => CheckoutError::ProductNotFound(line.product_id.clone()),
                Err(e) => CheckoutError::Persistence(e),
            };

            metrics::counter!("stock_reservations_total", "outcome" => "rejected").increment(1);
            tracing::info!(product_id = %line.product_id, error = %failure, "reservation refused");
            self.release(&reservation).await;
            return Err(failure);
        }

        metrics::counter!("stock_reservations_total", "outcome" => "reserved").increment(1);
        Ok(reservation)
    }

    /// Puts reserved stock back, last line first.
    ///
    /// Every line is attempted even if an earlier restore fails.
    pub async fn release(&self, reservation: &Reservation) -> Release {
        let mut release = Release::default();
        for line in reservation.lines.iter().rev() {
            let id = &line.product.id;
            match bounded(
                self.timeout,
                self.catalog.restore_stock(id, line.quantity),
            )
            .await
            {
                Ok(()) => {
                    metrics::counter!("stock_compensations_total", "outcome" => "restored")
                        .increment(1);
                    release.restored.push(id.clone());
                }
                Err(e) => {
                    metrics::counter!("stock_compensations_total", "outcome" => "failed")
                        .increment(1);
                    tracing::error!(product_id = %id, quantity = line.quantity, error = %e, "failed to restore reserved stock");
                    release.failed.push(id.clone());
                }
            }
        }
        release
    }
}
