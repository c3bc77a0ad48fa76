//! External collaborators of the checkout core and their in-memory stand-ins.

pub mod notification;
pub mod payment;

pub use notification::{
    LogNotificationSink, NotificationError, NotificationSink, RecordingNotificationSink,
};
pub use payment::{InMemoryPaymentGateway, PaymentConfirmation, PaymentGateway, STATUS_COMPLETED};
