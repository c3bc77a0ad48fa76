//! Persistence ports and adapters for the storefront checkout core.
//!
//! Three ports ([`CatalogStore`], [`CartStore`], [`OrderStore`]) with two
//! adapters each: [`InMemoryStore`] for tests and local runs, and
//! [`PostgresStore`] for deployments.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod memory;
pub mod orders;
pub mod postgres;

pub use cart::CartStore;
pub use catalog::{CatalogStore, Decrement, Drain};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use orders::OrderStore;
pub use postgres::PostgresStore;

/// A single backend implementing every storefront port.
pub trait StorefrontStore: CatalogStore + CartStore + OrderStore + Clone + 'static {}

impl<T> StorefrontStore for T where T: CatalogStore + CartStore + OrderStore + Clone + 'static {}
