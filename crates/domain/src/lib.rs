//! Domain layer for the storefront checkout core.
//!
//! This crate provides the core domain abstractions including:
//! - Product snapshots as read from the catalog
//! - Cart aggregate and the cart merge algorithm
//! - Order aggregate, its builder and the fulfillment state machine

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartLine, MergeToken};
pub use common::{OrderId, ProductId, UserId};
pub use error::DomainError;
pub use money::{Money, ParseMoneyError};
pub use order::{
    CustomerInfo, ExternalPayment, FulfillmentState, Order, OrderDraft, OrderError, OrderLine,
    UnknownFulfillmentState,
};
pub use product::Product;
