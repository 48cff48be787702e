//! # User Repository
//!
//! Account storage. Password hashing happens in the API layer; this
//! repository only ever sees the PHC string.
//!
//! ## First-User Bootstrap
//! ```text
//! register("alice")  users empty?  yes ──► role = admin
//! register("bob")    users empty?  no  ──► role = cashier
//! ```
//! The emptiness check and the insert are one statement, so two concurrent
//! first registrations cannot both become admin.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user with an explicit role.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "username" }`
    pub async fn insert(&self, user: &User) -> DbResult<User> {
        debug!(id = %user.id, username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("username"))?;

        Ok(user.clone())
    }

    /// Registers a new account. The first account ever created is an admin,
    /// every later one a cashier.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "username" }`
    pub async fn register(
        &self,
        username: &str,
        password_hash: &str,
        full_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<User> {
        let id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, role, created_at)
            SELECT ?1, ?2, ?3, ?4,
                   CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'cashier' ELSE 'admin' END,
                   ?5
            RETURNING id, username, password_hash, full_name, role, created_at
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(password_hash)
        .bind(full_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("username"))?;

        if user.role == Role::Admin {
            info!(username = %user.username, "First account registered as admin");
        } else {
            debug!(username = %user.username, role = %user.role, "Account registered");
        }

        Ok(user)
    }

    /// Looks a user up by username, case-insensitively.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, full_name, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
