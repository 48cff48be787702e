//! # Catalogue Rules
//!
//! Builds and updates products and categories from validated input.
//!
//! ## SKU Handling
//! ```text
//! create: sku blank?  ──yes──► generate "SKU-<unix nanos>"
//!                     ──no───► use as given (trimmed)
//!
//! update: sku blank?  ──yes──► keep the existing SKU
//!                     ──no───► replace
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Category, CategoryInput, Product, ProductInput};
use crate::validation::{validate_category_input, validate_product_input, ValidationResult};

/// Generates a SKU from the clock. Unique per nanosecond; the store's unique
/// index rejects the rare collision.
pub fn generate_sku(now: DateTime<Utc>) -> String {
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000);
    format!("SKU-{}", nanos)
}

fn given_sku(input: &ProductInput) -> Option<String> {
    input
        .sku
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clean_description(input: &ProductInput) -> Option<String> {
    input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validates `input` and builds a new product.
pub fn new_product(input: &ProductInput, now: DateTime<Utc>) -> ValidationResult<Product> {
    validate_product_input(input)?;

    Ok(Product {
        id: Uuid::new_v4().to_string(),
        category_id: input.category_id.trim().to_string(),
        name: input.name.trim().to_string(),
        sku: given_sku(input).unwrap_or_else(|| generate_sku(now)),
        description: clean_description(input),
        price_cents: input.price_cents,
        cost_cents: input.cost_cents,
        stock: input.stock,
        created_at: now,
        updated_at: now,
    })
}

/// Validates `input` and returns `existing` with every field replaced,
/// except a blank SKU which keeps the current one.
pub fn update_product(
    existing: &Product,
    input: &ProductInput,
    now: DateTime<Utc>,
) -> ValidationResult<Product> {
    validate_product_input(input)?;

    Ok(Product {
        id: existing.id.clone(),
        category_id: input.category_id.trim().to_string(),
        name: input.name.trim().to_string(),
        sku: given_sku(input).unwrap_or_else(|| existing.sku.clone()),
        description: clean_description(input),
        price_cents: input.price_cents,
        cost_cents: input.cost_cents,
        stock: input.stock,
        created_at: existing.created_at,
        updated_at: now,
    })
}

pub fn new_category(input: &CategoryInput, now: DateTime<Utc>) -> ValidationResult<Category> {
    validate_category_input(input)?;

    Ok(Category {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn rename_category(
    existing: &Category,
    input: &CategoryInput,
    now: DateTime<Utc>,
) -> ValidationResult<Category> {
    validate_category_input(input)?;

    Ok(Category {
        id: existing.id.clone(),
        name: input.name.trim().to_string(),
        created_at: existing.created_at,
        updated_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
