//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors                                                     │
//! │  ├── CheckoutError    - Everything a sale can fail with (this file)    │
//! │  ├── ValidationError  - Input validation failures (this file)          │
//! │  └── StoreError       - Typed storage failures (store.rs)              │
//! │                                                                         │
//! │  tally-db errors                                                       │
//! │  └── DbError          - sqlx failures, converted into StoreError       │
//! │                                                                         │
//! │  tally-api errors                                                      │
//! │  └── ApiError         - What HTTP clients see (status + code + message)│
//! │                                                                         │
//! │  Flow: DbError → StoreError → CheckoutError → ApiError → client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derives, no manual `Display` impls
//! 2. Context in the variant (product id, amounts), never a bare String
//! 3. Storage failures are classified by variant, never by message text

use thiserror::Error;

use crate::money::Money;
use crate::store::StoreError;

// =============================================================================
// Checkout Error
// =============================================================================

/// Why a sale was not committed.
///
/// Every variant is terminal for the attempt and leaves no partial effect:
/// either nothing was written, or the store rolled its unit of work back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The basket had no lines.
    #[error("Basket is empty")]
    EmptyBasket,

    /// A requested product does not exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// The basket asks for more units than the snapshot shows on hand.
    ///
    /// ## When This Occurs
    /// `requested` is cumulative across every line for the product:
    /// ```text
    /// stock(P) = 5
    /// line 1: P × 3   → running total 3  (ok)
    /// line 2: P × 3   → running total 6  ✗
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: P, available: 5, requested: 6 }
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Discount is larger than the basket total.
    #[error("Discount {discount} exceeds total {total}")]
    InvalidDiscount { total: Money, discount: Money },

    /// Cash tendered does not cover the grand total.
    #[error("Payment of {cash} does not cover grand total {grand_total}")]
    PaymentInsufficient { grand_total: Money, cash: Money },

    /// Stock changed between the snapshot and the commit.
    ///
    /// ## When This Occurs
    /// Two terminals sell the last unit at once. Both validate against the
    /// same snapshot; the store's commit-time check lets exactly one win.
    /// The loser gets this error and may retry with a fresh read.
    #[error("Stock for {product_id} changed during checkout")]
    StockConflict { product_id: String },

    /// The store failed to read or to apply the unit of work.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[source] StoreError),

    /// Lookup of a committed sale by id found nothing.
    #[error("Sale not found: {id}")]
    SaleNotFound { id: String },

    /// Request field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CheckoutError {
    /// Whether re-running the same request against fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::StockConflict { .. } | CheckoutError::PersistenceFailed(_)
        )
    }
}

/// Store failures surface as `StockConflict` when the commit-time stock check
/// tripped, and as `PersistenceFailed` otherwise.
impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StockConflict { product_id } => CheckoutError::StockConflict { product_id },
            other => CheckoutError::PersistenceFailed(other),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic or storage access runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
