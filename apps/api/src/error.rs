//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                           │
//! │         │                                                               │
//! │         ├── DbError        (catalogue, accounts)  ──┐                   │
//! │         ├── CheckoutError  (sales)                ──┼──► ApiError       │
//! │         ├── ValidationError                       ──┤      │            │
//! │         └── AuthError                             ──┘      ▼            │
//! │                                                   status + JSON body    │
//! │                                                                         │
//! │  { "code": "STOCK_CONFLICT", "message": "Stock changed ..." }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged with their detail and returned to the client
//! as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::{CheckoutError, StoreError, ValidationError};
use tally_db::DbError;
use tracing::{error, warn};

use crate::auth::AuthError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 5f0c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Checkout with no lines (400)
    EmptyBasket,

    /// Basket asks for more than is on hand (422)
    InsufficientStock,

    /// Discount larger than the basket total (422)
    InvalidDiscount,

    /// Cash does not cover the grand total (402)
    PaymentInsufficient,

    /// Missing, malformed or expired credentials (401)
    Unauthorized,

    /// Authenticated but role not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Stock changed between snapshot and commit (409)
    StockConflict,

    /// Duplicate value or resource still referenced (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::EmptyBasket => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock | ErrorCode::InvalidDiscount => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::PaymentInsufficient => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::StockConflict | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    fn database(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Database operation failed");
        ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field } => {
                ApiError::new(ErrorCode::Conflict, format!("{} already exists", field))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::new(
                    ErrorCode::Conflict,
                    "Record is referenced by other data or references a missing record",
                )
            }
            DbError::CheckViolation { message } => {
                warn!(%message, "Check constraint violation");
                ApiError::validation("Value violates a data constraint")
            }
            DbError::StockConflict { product_id } => ApiError::new(
                ErrorCode::StockConflict,
                format!("Stock for {} changed; please retry", product_id),
            ),
            other => ApiError::database(other),
        }
    }
}

/// Converts checkout errors to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyBasket => ApiError::new(ErrorCode::EmptyBasket, err.to_string()),
            CheckoutError::ProductNotFound { ref product_id } => {
                ApiError::not_found("Product", product_id)
            }
            CheckoutError::SaleNotFound { ref id } => ApiError::not_found("Transaction", id),
            CheckoutError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CheckoutError::InvalidDiscount { .. } => {
                ApiError::new(ErrorCode::InvalidDiscount, err.to_string())
            }
            CheckoutError::PaymentInsufficient { .. } => {
                ApiError::new(ErrorCode::PaymentInsufficient, err.to_string())
            }
            CheckoutError::StockConflict { ref product_id } => ApiError::new(
                ErrorCode::StockConflict,
                format!("Stock for {} changed during checkout; please retry", product_id),
            ),
            CheckoutError::Validation(e) => e.into(),
            CheckoutError::PersistenceFailed(StoreError::NotFound { entity, id }) => {
                ApiError::not_found(&entity, &id)
            }
            CheckoutError::PersistenceFailed(e) => ApiError::database(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(detail) => {
                error!(error = %detail, "Authentication backend failure");
                ApiError::internal("Authentication failed")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
