//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │   classified by ErrorKind / result code, never by message text │
//! │       ▼                                                                 │
//! │  DbError (this module)                                                 │
//! │       │                                                                 │
//! │       ├──► StoreError (checkout path, tally-core)                      │
//! │       └──► ApiError   (catalogue and account paths, tally-api)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use tally_core::StoreError;
use thiserror::Error;

/// SQLite primary result code for `SQLITE_BUSY`.
const SQLITE_BUSY: &str = "5";
/// Extended code `SQLITE_BUSY_SNAPSHOT`.
const SQLITE_BUSY_SNAPSHOT: &str = "517";
/// SQLite primary result code for `SQLITE_LOCKED`.
const SQLITE_LOCKED: &str = "6";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist on update or delete
    /// - `fetch_one` returned no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate SKU, category name, username or sale code
    ///
    /// `field` is filled in by the repository that knows which column it
    /// was inserting; SQLite does not report it in a structured way.
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product references a missing category
    /// - Deleting a product that appears on a sale
    /// - Deleting a category that still has products
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, inconsistent totals).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Guarded stock decrement matched no row during a sale.
    #[error("Stock conflict on product {product_id}")]
    StockConflict { product_id: String },

    /// Database stayed locked past the busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use past the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Names the column behind a unique violation; other errors pass through.
    pub fn on_unique(self, field: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { .. } => DbError::UniqueViolation {
                field: field.into(),
            },
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound              → DbError::NotFound
/// Database, kind UniqueViolation        → DbError::UniqueViolation
/// Database, kind ForeignKeyViolation    → DbError::ForeignKeyViolation
/// Database, kind CheckViolation         → DbError::CheckViolation
/// Database, code SQLITE_BUSY / LOCKED   → DbError::Busy
/// sqlx::Error::PoolTimedOut             → DbError::PoolExhausted
/// Other                                 → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => match db_err.code().as_deref() {
                        Some(SQLITE_BUSY) | Some(SQLITE_BUSY_SNAPSHOT) | Some(SQLITE_LOCKED) => {
                            DbError::Busy(message)
                        }
                        _ => DbError::QueryFailed(message),
                    },
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Storage failures as the checkout core sees them.
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::StockConflict { product_id } => StoreError::StockConflict { product_id },
            DbError::UniqueViolation { field } => StoreError::UniqueViolation { field },
            DbError::ForeignKeyViolation { message } => StoreError::ForeignKeyViolation { message },
            DbError::Busy(msg) | DbError::ConnectionFailed(msg) => StoreError::Unavailable(msg),
            DbError::PoolExhausted => StoreError::Unavailable("connection pool exhausted".to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
