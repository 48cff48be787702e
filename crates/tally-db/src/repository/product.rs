//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Paged listing (`LIMIT` / `OFFSET`)
//! - Checkout snapshots (see [`crate::SaleRepository`])
//!
//! Stock is never adjusted here outside of a full product update. Sales
//! decrement stock through the guarded `UPDATE` in the sale repository so the
//! decrement and the sale rows commit together.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{PageRequest, Product};

const PRODUCT_COLUMNS: &str = r#"
    id,
    category_id,
    name,
    sku,
    description,
    price_cents,
    cost_cents,
    stock,
    created_at,
    updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let page = repo.list(PageRequest::new(Some(2), Some(20))).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists one page of products ordered by name.
    pub async fn list(&self, page: PageRequest) -> DbResult<Vec<Product>> {
        debug!(page = page.page, page_size = page.page_size, "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE NOCASE, id LIMIT ?1 OFFSET ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "sku" }` - SKU already in use
    /// * `DbError::ForeignKeyViolation` - category doesn't exist
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, sku, description,
                price_cents, cost_cents, stock,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("sku"))?;

        Ok(product.clone())
    }

    /// Replaces every mutable field of a product.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - product doesn't exist
    /// * `DbError::UniqueViolation { field: "sku" }` - SKU taken by another product
    /// * `DbError::ForeignKeyViolation` - category doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                name = ?3,
                sku = ?4,
                description = ?5,
                price_cents = ?6,
                cost_cents = ?7,
                stock = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("sku"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - product doesn't exist
    /// * `DbError::ForeignKeyViolation` - product appears on a committed sale
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
