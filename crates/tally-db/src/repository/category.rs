//! # Category Repository
//!
//! Database operations for product categories. Names are unique
//! case-insensitively (`COLLATE NOCASE` on the column).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "name" }` - name already taken
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("name"))?;

        Ok(category.clone())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM categories
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Renames a category.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - category doesn't exist
    /// * `DbError::UniqueViolation { field: "name" }` - name already taken
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories SET name = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("name"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - category doesn't exist
    /// * `DbError::ForeignKeyViolation` - products still belong to it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
