//! # Sale Repository
//!
//! Database operations for sales and sale items, and the SQLite
//! implementation of [`CheckoutStore`].
//!
//! ## Atomic Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       apply_sale(mutations, sale)                       │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── UPDATE products SET stock = stock - qty                           │
//! │   │   WHERE id = ? AND stock >= qty          (once per product)         │
//! │   │       └── 0 rows ──► return StockConflict (tx dropped = ROLLBACK)   │
//! │   │                                                                     │
//! │   ├── INSERT INTO sales (...)                                           │
//! │   ├── INSERT INTO sale_items (...)           (once per line)            │
//! │   │                                                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `stock >= qty` guard is evaluated against the committed stock under
//! SQLite's write lock, so a sale that committed after the snapshot was
//! taken is seen here. Concurrent writers wait on the busy timeout instead
//! of failing immediately.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use tally_core::{CheckoutStore, ProductSnapshot, Sale, SaleLine, StockMutation, StoreError};

const SALE_COLUMNS: &str = r#"
    id,
    code,
    total_amount_cents,
    discount_cents,
    grand_total_cents,
    cash_cents,
    change_cents,
    payment_method,
    cashier_id,
    created_at
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id,
    sale_id,
    product_id,
    product_name,
    quantity,
    unit_price_cents,
    subtotal_cents,
    position
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Reads the checkout-relevant fields of a product.
    pub async fn product_snapshot(&self, product_id: &str) -> DbResult<Option<ProductSnapshot>> {
        let snapshot = sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT id AS product_id, name, price_cents, stock
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Applies stock decrements and inserts the sale with its lines in one
    /// transaction.
    ///
    /// ## Errors
    /// * `DbError::StockConflict` - a product no longer has enough stock, or
    ///   no longer exists
    /// * `DbError::UniqueViolation { field: "code" }` - sale code collision
    /// * `DbError::Busy` / `DbError::PoolExhausted` - timed out waiting
    pub async fn apply_sale(&self, mutations: &[StockMutation], sale: &Sale) -> DbResult<Sale> {
        debug!(
            sale_id = %sale.id,
            code = %sale.code,
            products = mutations.len(),
            lines = sale.items.len(),
            "Beginning sale transaction"
        );

        let mut tx = self.pool.begin().await?;

        for mutation in mutations {
            let quantity = mutation.quantity();

            let result = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock - ?1,
                    updated_at = ?2
                WHERE id = ?3 AND stock >= ?4
                "#,
            )
            .bind(quantity)
            .bind(sale.created_at)
            .bind(&mutation.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(
                    product_id = %mutation.product_id,
                    snapshot_stock = mutation.snapshot_stock,
                    quantity,
                    "Stock changed since snapshot; rolling back sale"
                );
                return Err(DbError::StockConflict {
                    product_id: mutation.product_id.clone(),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, code,
                total_amount_cents, discount_cents, grand_total_cents,
                cash_cents, change_cents,
                payment_method, cashier_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.code)
        .bind(sale.total_amount_cents)
        .bind(sale.discount_cents)
        .bind(sale.grand_total_cents)
        .bind(sale.cash_cents)
        .bind(sale.change_cents)
        .bind(&sale.payment_method)
        .bind(&sale.cashier_id)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).on_unique("code"))?;

        for line in &sale.items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name,
                    quantity, unit_price_cents, subtotal_cents, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&line.id)
            .bind(&line.sale_id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .bind(line.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            code = %sale.code,
            grand_total_cents = sale.grand_total_cents,
            "Sale committed"
        );

        Ok(sale.clone())
    }

    /// Gets a sale by ID, with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match sale {
            Some(mut sale) => {
                sale.items = self.get_items(&sale.id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// Gets all lines of a sale in basket order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
        );

        let items = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists every sale with its lines, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC");

        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("SELECT {SALE_ITEM_COLUMNS} FROM sale_items ORDER BY sale_id, position");

        let items = sqlx::query_as::<_, SaleLine>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<SaleLine>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// CheckoutStore
// =============================================================================

#[async_trait]
impl CheckoutStore for SaleRepository {
    async fn read_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError> {
        Ok(self.product_snapshot(product_id).await?)
    }

    async fn atomic_apply(&self, mutations: &[StockMutation], sale: &Sale) -> Result<Sale, StoreError> {
        Ok(self.apply_sale(mutations, sale).await?)
    }

    async fn get_sale(&self, sale_id: &str) -> Result<Option<Sale>, StoreError> {
        Ok(self.get_by_id(sale_id).await?)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError> {
        Ok(self.list().await?)
    }
}
