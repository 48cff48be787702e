//! # Validation Module
//!
//! Input rules for catalogue, account and checkout requests.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_* (THIS MODULE) ──✗──► ValidationError ──► 400               │
//! │       │                                                                 │
//! │       ▼ ok                                                              │
//! │  business logic / storage                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes, so names in any script
//! get the same limits.

use crate::error::ValidationError;
use crate::types::{CategoryInput, CheckoutRequest, ProductInput};
use crate::{MAX_BASKET_LINES, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.trim().chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use tally_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_length("sku", sku, 1, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (3 to 100 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_length("name", name, 3, 100)
}

/// Validates a category name (3 to 50 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_length("name", name, 3, 50)
}

/// Validates a payment method label (1 to 50 characters).
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    validate_length("payment_method", method, 1, 50)
}

/// Validates a login name (3 to 50 characters, no whitespace).
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_length("username", username, 3, 50)?;

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password (at least 8 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a basket line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a catalogue selling price. Free items are not sold through the
/// catalogue, so zero is rejected.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_cost_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative("cost", cents)
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    validate_non_negative("stock", stock)
}

/// Validates a tendered or discount amount (zero allowed).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_non_negative(field, cents)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a basket (MAX_BASKET_LINES at most).
///
/// Emptiness is a checkout error in its own right and is checked by the
/// orchestrator before this runs.
pub fn validate_basket_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_BASKET_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BASKET_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use tally_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates every field of a product create/replace request.
/// A blank SKU is allowed here; the caller generates one.
pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    if let Some(sku) = input.sku.as_deref().filter(|s| !s.trim().is_empty()) {
        validate_sku(sku)?;
    }
    validate_price_cents(input.price_cents)?;
    validate_cost_cents(input.cost_cents)?;
    validate_stock(input.stock)?;
    if input.category_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "category_id".to_string(),
        });
    }
    Ok(())
}

pub fn validate_category_input(input: &CategoryInput) -> ValidationResult<()> {
    validate_category_name(&input.name)
}

/// Field-level checks on a checkout request. Does not check emptiness.
pub fn validate_checkout_request(req: &CheckoutRequest) -> ValidationResult<()> {
    validate_payment_method(&req.payment_method)?;
    validate_amount_cents("cash", req.cash_cents)?;
    validate_amount_cents("discount", req.discount_cents)?;
    validate_basket_size(req.items.len())?;

    for line in &req.items {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
