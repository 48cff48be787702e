//! # Checkout Store Contract
//!
//! What the checkout orchestrator needs from persistence, and nothing more.
//!
//! ## Atomic Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  atomic_apply(mutations, sale)                                          │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── for each mutation:                                                │
//! │   │     stock(P) := stock(P) - qty   only if the result stays >= 0      │
//! │   │     otherwise ──────────────────────────► ROLLBACK, StockConflict   │
//! │   ├── insert sale header                                                │
//! │   ├── insert sale lines                                                 │
//! │   │     any failure ────────────────────────► ROLLBACK, other variant   │
//! │  COMMIT ─────────────────────────────────────► Ok(sale)                 │
//! │                                                                         │
//! │  Either every write lands or none does.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The non-negative check runs under the store's own isolation at commit
//! time, so it sees any sale that committed after the orchestrator took
//! its snapshot. That is what makes the checkout optimistic rather than
//! lost-update prone.
//!
//! ## Implementations
//! - `tally_db::SaleRepository` (SQLite, guarded `UPDATE`)
//! - in-memory stores in this crate's integration tests

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ProductSnapshot, Sale, StockMutation};

// =============================================================================
// Store Error
// =============================================================================

/// Typed storage failures.
///
/// Backends classify their native errors into these variants; callers match
/// on the variant and never on message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The commit-time stock check failed for this product, or the product
    /// disappeared before commit.
    #[error("Stock conflict on product {product_id}")]
    StockConflict { product_id: String },

    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Store could not be reached in time (pool exhausted, database busy).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store error: {0}")]
    Backend(String),
}

// =============================================================================
// Checkout Store
// =============================================================================

/// Persistence needed by [`crate::checkout::CheckoutService`].
///
/// Handed to the service at construction; there is no global store.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Reads the current price and stock of a product. `Ok(None)` when the
    /// product does not exist.
    async fn read_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError>;

    /// Applies every stock mutation and inserts `sale` with all of its lines
    /// as one all-or-nothing unit.
    ///
    /// Fails with [`StoreError::StockConflict`] when any product would end up
    /// below zero given the stock at commit time.
    async fn atomic_apply(&self, mutations: &[StockMutation], sale: &Sale) -> Result<Sale, StoreError>;

    /// Loads a committed sale with its lines.
    async fn get_sale(&self, sale_id: &str) -> Result<Option<Sale>, StoreError>;

    /// Lists committed sales with their lines, newest first.
    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError>;
}
