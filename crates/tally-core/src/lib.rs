//! # tally-core: Pure Business Logic for Tally POS
//!
//! Checkout rules, pricing math, validation and the storage contract.
//! Nothing in this crate opens a file, a socket or a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-api (axum)                             │   │
//! │  │    /auth  /products  /categories  /transactions                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  money   │  │ pricing  │  │ checkout │  │    store     │   │   │
//! │  │   │  Money   │  │  basket  │  │ Service  │  │ CheckoutStore│   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────┬───────┘   │   │
//! │  └─────────────────────────────────────────────────────┼───────────┘   │
//! │                                                        │ implemented by │
//! │  ┌─────────────────────────────────────────────────────▼───────────┐   │
//! │  │                    tally-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, snapshots, mutations, roles)
//! - [`money`] - Integer-cent money type
//! - [`error`] - Checkout and validation errors
//! - [`validation`] - Input rules
//! - [`catalog`] - Product and category construction, SKU generation
//! - [`pricing`] - Pure basket calculator
//! - [`store`] - Storage contract for checkout
//! - [`checkout`] - Checkout orchestrator
//!
//! ## Example
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! let unit = Money::from_cents(1000);
//! let total = unit.multiply_quantity(2) + Money::from_cents(500).multiply_quantity(3);
//! assert_eq!(total.cents(), 3500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::CheckoutService;
pub use error::{CheckoutError, CheckoutResult, ValidationError};
pub use money::Money;
pub use store::{CheckoutStore, StoreError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single basket.
pub const MAX_BASKET_LINES: usize = 100;

/// Maximum quantity on a single basket line.
///
/// Catches typos like 1000 for 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;
