use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, FulfillmentState, MergeToken, Order, Product};
use tokio::sync::RwLock;

use crate::{
    CartStore, CatalogStore, Decrement, Drain, OrderStore, Result, StoreError,
};

#[derive(Default)]
struct CartState {
    carts: HashMap<UserId, Cart>,
    merge_tokens: HashSet<(UserId, MergeToken)>,
}

/// Switches for simulating infrastructure failures in tests.
#[derive(Default)]
struct Faults {
    fail_create_order: AtomicBool,
    fail_replace_cart: AtomicBool,
    fail_restore_stock: AtomicBool,
    create_order_delay_ms: AtomicU64,
}

/// In-memory storefront store for tests and local runs.
///
/// Each collection sits behind its own lock. Stock mutations take the
/// catalog write lock for the whole check-and-update, which is what makes
/// them atomic.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    carts: Arc<RwLock<CartState>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given products.
    pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        {
            let mut map = store.products.write().await;
            for product in products {
                map.insert(product.id.clone(), product);
            }
        }
        store
    }

    /// Current stock of a product, if it exists.
    pub async fn stock_of(&self, id: &ProductId) -> Option<u32> {
        self.products.read().await.get(id).map(|p| p.stock)
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Makes every subsequent `create_order` fail.
    pub fn set_fail_on_create_order(&self, fail: bool) {
        self.faults.fail_create_order.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent cart replacement fail.
    pub fn set_fail_on_replace_cart(&self, fail: bool) {
        self.faults.fail_replace_cart.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `restore_stock` fail.
    pub fn set_fail_on_restore_stock(&self, fail: bool) {
        self.faults.fail_restore_stock.store(fail, Ordering::SeqCst);
    }

    /// Delays `create_order` before it touches any state.
    pub fn set_create_order_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.faults
            .create_order_delay_ms
            .store(millis, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{operation} failed")));
        }
        Ok(())
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    orders
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<Decrement> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(id) else {
            return Ok(Decrement::NotFound);
        };
        if product.stock < quantity {
            return Ok(Decrement::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        Ok(Decrement::Applied(product.clone()))
    }

    async fn drain_stock(&self, id: &ProductId, quantity: u32) -> Result<Option<Drain>> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(id).map(|product| {
            let taken = product.stock.min(quantity);
            product.stock -= taken;
            Drain {
                requested: quantity,
                taken,
                remaining: product.stock,
            }
        }))
    }

    async fn restore_stock(&self, id: &ProductId, quantity: u32) -> Result<()> {
        Self::check(&self.faults.fail_restore_stock, "restore_stock")?;
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;
        product.stock = product.stock.saturating_add(quantity);
        Ok(())
    }

    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;
        product.stock = stock;
        Ok(product.clone())
    }

    async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Cart> {
        Ok(self
            .carts
            .read()
            .await
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: UserId, cart: &Cart) -> Result<()> {
        Self::check(&self.faults.fail_replace_cart, "replace_cart")?;
        self.carts.write().await.carts.insert(user_id, cart.clone());
        Ok(())
    }

    async fn replace_cart_once(
        &self,
        user_id: UserId,
        token: MergeToken,
        cart: &Cart,
    ) -> Result<bool> {
        Self::check(&self.faults.fail_replace_cart, "replace_cart")?;
        let mut state = self.carts.write().await;
        if !state.merge_tokens.insert((user_id, token)) {
            return Ok(false);
        }
        state.carts.insert(user_id, cart.clone());
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        let delay = self.faults.create_order_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Self::check(&self.faults.fail_create_order, "create_order")?;

        let mut orders = self.orders.write().await;
        if let Some(external_id) = order.external_payment_id()
            && orders
                .values()
                .any(|o| o.external_payment_id() == Some(external_id))
        {
            return Err(StoreError::DuplicateExternalPayment(external_id.to_string()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_external_payment_id(&self, external_id: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.external_payment_id() == Some(external_id))
            .cloned())
    }

    async fn update_fulfillment_state(
        &self,
        id: OrderId,
        from: FulfillmentState,
        to: FulfillmentState,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(StoreError::OrderNotFound(id))?;
        if order.fulfillment_state() != from {
            return Err(StoreError::ConcurrencyConflict {
                order_id: id,
                expected: from,
                actual: order.fulfillment_state(),
            });
        }
        order
            .advance_fulfillment(to)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(order.clone())
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(
            orders
                .values()
                .filter(|o| o.is_owned_by(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        Ok(newest_first(
            self.orders.read().await.values().cloned().collect(),
        ))
    }
}
