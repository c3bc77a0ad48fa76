use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, CartLine, FulfillmentState, MergeToken, Money, Order, Product};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    CartStore, CatalogStore, Decrement, Drain, OrderStore, Result, StoreError,
};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, image, category";

/// PostgreSQL-backed storefront store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let id: String = row.try_get("id")?;
        let stock: i64 = row.try_get("stock")?;
        Ok(Product {
            id: ProductId::new(id),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: to_u32("stock", stock)?,
            image: row.try_get("image")?,
            category: row.try_get("category")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    async fn write_cart_lines(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        cart: &Cart,
    ) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut **tx)
            .await?;

        for line in cart.lines() {
            sqlx::query(
                "INSERT INTO cart_lines (user_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(user_id.as_uuid())
            .bind(line.product_id.as_str())
            .bind(i64::from(line.quantity))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn current_stock(&self, id: &ProductId) -> Result<Option<u32>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        stock.map(|s| to_u32("stock", s)).transpose()
    }
}

fn to_u32(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<Decrement> {
        // The guard and the write are one statement, so concurrent callers
        // serialize on the row lock and re-check the predicate.
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Decrement::Applied(Self::row_to_product(&row)?));
        }

        match self.current_stock(id).await? {
            Some(available) => {
                tracing::debug!(product_id = %id, requested = quantity, available, "decrement refused");
                Ok(Decrement::Insufficient { available })
            }
            None => Ok(Decrement::NotFound),
        }
    }

    async fn drain_stock(&self, id: &ProductId, quantity: u32) -> Result<Option<Drain>> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };
        let previous = to_u32("stock", previous)?;
        let taken = previous.min(quantity);
        let remaining = previous - taken;

        sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_str())
            .bind(i64::from(remaining))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Drain {
            requested: quantity,
            taken,
            remaining,
        }))
    }

    async fn restore_stock(&self, id: &ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(id.clone()));
        }
        Ok(())
    }

    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(i64::from(stock))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(&row),
            None => Err(StoreError::ProductNotFound(id.clone())),
        }
    }

    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, image, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                image = EXCLUDED.image,
                category = EXCLUDED.category,
                updated_at = NOW()
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(&product.image)
        .bind(&product.category)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Cart> {
        let rows = sqlx::query("SELECT product_id, quantity FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        let lines = rows
            .iter()
            .map(|row| {
                let product_id: String = row.try_get("product_id")?;
                let quantity = to_u32("quantity", row.try_get("quantity")?)?;
                CartLine::new(product_id, quantity).map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Cart::from_lines(lines))
    }

    async fn replace_cart(&self, user_id: UserId, cart: &Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_cart_lines(&mut tx, user_id, cart).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_cart_once(
        &self,
        user_id: UserId,
        token: MergeToken,
        cart: &Cart,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let recorded = sqlx::query(
            "INSERT INTO cart_merge_tokens (user_id, token) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .bind(token.as_uuid())
        .execute(&mut *tx)
        .await?;

        if recorded.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::debug!(%user_id, %token, "merge token already consumed");
            return Ok(false);
        }

        Self::write_cart_lines(&mut tx, user_id, cart).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, external_payment_id, fulfillment_state, created_at, document)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().map(|u| u.as_uuid()))
        .bind(order.external_payment_id())
        .bind(order.fulfillment_state().as_str())
        .bind(order.created_at())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_external_payment_id")
            {
                return StoreError::DuplicateExternalPayment(
                    order.external_payment_id().unwrap_or_default().to_string(),
                );
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn find_by_external_payment_id(&self, external_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE external_payment_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn update_fulfillment_state(
        &self,
        id: OrderId,
        from: FulfillmentState,
        to: FulfillmentState,
    ) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_state = $3,
                document = jsonb_set(document, '{fulfillment_state}', to_jsonb($3::text))
            WHERE id = $1 AND fulfillment_state = $2
            RETURNING document
            "#,
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(&row);
        }

        let actual: Option<String> =
            sqlx::query_scalar("SELECT fulfillment_state FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match actual {
            None => Err(StoreError::OrderNotFound(id)),
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                order_id: id,
                expected: from,
                actual: actual
                    .parse()
                    .map_err(|e: domain::UnknownFulfillmentState| StoreError::Corrupt(e.to_string()))?,
            }),
        }
    }

    async fn list_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT document FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_order).collect()
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT document FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_order).collect()
    }
}
