//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalogue                 Checkout input           Checkout output     │
//! │  ┌──────────────┐          ┌────────────────┐       ┌──────────────┐    │
//! │  │  Category    │          │ CheckoutRequest│       │    Sale      │    │
//! │  │  Product ────┼──read──► │ LineItemRequest│       │  SaleLine[]  │    │
//! │  └──────────────┘    │     └────────────────┘       └──────────────┘    │
//! │                      ▼                                     ▲            │
//! │              ProductSnapshot ──► pricing ──► StockMutation ┘            │
//! │                                                                         │
//! │  Access: User, Role (admin / manager / cashier)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every persisted entity is keyed by a UUID v4 string. Sales additionally
//! carry a human-readable `code` (`INV-...`) that is unique per store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product grouping (e.g. "Beverages").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category this product belongs to.
    pub category_id: String,

    /// Display name, copied onto each sale line at checkout.
    pub name: String,

    /// Stock Keeping Unit. Generated when the caller leaves it blank.
    pub sku: String,

    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (for margin reporting).
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Point-in-time view used by checkout.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id.clone(),
            name: self.name.clone(),
            price_cents: self.price_cents,
            stock: self.stock,
        }
    }
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    pub stock: i64,
    pub category_id: String,
}

/// Fields accepted when creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

// =============================================================================
// Checkout Input
// =============================================================================

/// A point-in-time copy of a product's checkout-relevant fields.
///
/// Read once per distinct product per checkout. The orchestrator never
/// assumes it is still accurate when the sale commits; the store re-checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl ProductSnapshot {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// One requested line in a basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A request to ring up a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Free-form tender label ("Cash", "QRIS", ...).
    pub payment_method: String,

    /// Amount tendered by the customer, in cents.
    pub cash_cents: i64,

    /// Flat discount off the basket total, in cents.
    #[serde(default)]
    pub discount_cents: i64,

    /// Ordered basket. The same product may appear more than once.
    pub items: Vec<LineItemRequest>,

    /// Authenticated user ringing the sale. Filled in by the API layer.
    #[serde(skip)]
    pub cashier_id: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted line on a sale. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Always `quantity * unit_price_cents`.
    pub subtotal_cents: i64,
    /// Zero-based position in the original basket.
    pub position: i64,
}

impl SaleLine {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A committed sale. Sales are append-only; nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Human-readable unique code, e.g. `INV-20260119143005-9f2c1a7b`.
    pub code: String,
    /// Sum of line subtotals before discount.
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    /// `total_amount_cents - discount_cents`.
    pub grand_total_cents: i64,
    pub cash_cents: i64,
    /// `cash_cents - grand_total_cents`.
    pub change_cents: i64,
    pub payment_method: String,
    pub cashier_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleLine>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Stock Mutation
// =============================================================================

/// The stock change one sale makes to one product.
///
/// `new_stock` is computed from the snapshot. Stores apply it as a decrement
/// of `quantity()` guarded by a non-negative check, so a concurrent sale that
/// committed in between is detected instead of overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMutation {
    pub product_id: String,
    pub snapshot_stock: i64,
    pub new_stock: i64,
}

impl StockMutation {
    /// Units removed from stock by this mutation.
    #[inline]
    pub fn quantity(&self) -> i64 {
        self.snapshot_stock - self.new_stock
    }
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Access role. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "cashier" => Ok(Role::Cashier),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "cashier".into()],
            }),
        }
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// One-based page request. Non-positive values fall back to page 1, size 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
    pub const MAX_PAGE_SIZE: i64 = 100;

    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .min(Self::MAX_PAGE_SIZE);
        PageRequest { page, page_size }
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
