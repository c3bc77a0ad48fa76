//! Order creation and cart reconciliation for the storefront.
//!
//! The order creation workflow follows these steps:
//! 1. Validate the requested lines
//! 2. Reserve stock for every line (all or nothing)
//! 3. Price the order from the reserved product snapshots
//! 4. Persist the order
//! 5. Clear the buyer's cart (best-effort)
//! 6. Notify (detached, best-effort)
//!
//! If any step up to persisting fails, the reservation is released in
//! reverse order.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orders;
pub mod receipt;
pub mod reservation;
pub mod run;
pub mod services;
pub mod state;
pub mod workflow;

pub use cart::{CartService, MergeOutcome};
pub use catalog::CatalogService;
pub use config::CheckoutConfig;
pub use error::{CheckoutError, Result};
pub use orders::{OrderService, Viewer};
pub use receipt::render_receipt;
pub use reservation::{Release, Reservation, ReservationEngine, ReservedLine};
pub use run::WorkflowRun;
pub use services::{
    InMemoryPaymentGateway, LogNotificationSink, NotificationError, NotificationSink,
    PaymentConfirmation, PaymentGateway, RecordingNotificationSink,
};
pub use state::WorkflowStage;
pub use workflow::{CaptureRequest, LineRequest, OrderRequest, OrderWorkflow, validate_lines};
