//! # Pricing & Basket Calculator
//!
//! Turns a basket plus product snapshots into priced lines, totals, change
//! and the stock mutations a sale must apply. Pure: no clock, no storage,
//! no randomness.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line (in basket order):                                       │
//! │     requested(P) += qty            ── cumulative per product            │
//! │     requested(P) > stock(P)?  ──✗──► InsufficientStock                  │
//! │     subtotal = qty × price(P)                                           │
//! │                                                                         │
//! │  total       = Σ subtotal                                               │
//! │  grand_total = total − discount    ──< 0 ──► InvalidDiscount            │
//! │  change      = cash − grand_total  ──< 0 ──► PaymentInsufficient        │
//! │                                                                         │
//! │  mutations: one per distinct product, first-appearance order,           │
//! │             new_stock = stock(P) − requested(P)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Lines
//! A product listed twice shares one snapshot. Both lines are priced at the
//! same snapshot price and their quantities are summed before the stock
//! check and before the mutation is computed, so a basket can never
//! oversell by splitting a quantity across lines.

use std::collections::HashMap;

use crate::error::{CheckoutError, CheckoutResult, ValidationError};
use crate::money::Money;
use crate::types::{LineItemRequest, ProductSnapshot, StockMutation};

// =============================================================================
// Output Types
// =============================================================================

/// One basket line after pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Everything a sale needs, computed from a single set of snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedBasket {
    /// Priced lines in basket order.
    pub lines: Vec<PricedLine>,
    pub total_amount: Money,
    pub discount: Money,
    pub grand_total: Money,
    pub cash: Money,
    pub change: Money,
    /// One per distinct product, in order of first appearance.
    pub mutations: Vec<StockMutation>,
}

// =============================================================================
// Calculator
// =============================================================================

fn overflow(field: &str) -> CheckoutError {
    CheckoutError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    })
}

/// Prices a basket against product snapshots.
///
/// `snapshots` must hold one entry per distinct product id in `items`; a
/// missing entry is reported as [`CheckoutError::ProductNotFound`].
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use tally_core::money::Money;
/// use tally_core::pricing::price_basket;
/// use tally_core::types::{LineItemRequest, ProductSnapshot};
///
/// let mut snapshots = HashMap::new();
/// snapshots.insert("p1".to_string(), ProductSnapshot {
///     product_id: "p1".into(), name: "Kopi".into(), price_cents: 1000, stock: 10,
/// });
/// let items = vec![LineItemRequest { product_id: "p1".into(), quantity: 2 }];
///
/// let basket = price_basket(&items, &snapshots, Money::zero(), Money::from_cents(5000)).unwrap();
/// assert_eq!(basket.grand_total.cents(), 2000);
/// assert_eq!(basket.change.cents(), 3000);
/// assert_eq!(basket.mutations[0].new_stock, 8);
/// ```
pub fn price_basket(
    items: &[LineItemRequest],
    snapshots: &HashMap<String, ProductSnapshot>,
    discount: Money,
    cash: Money,
) -> CheckoutResult<PricedBasket> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyBasket);
    }

    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut first_seen: Vec<&ProductSnapshot> = Vec::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut total_amount = Money::zero();

    for item in items {
        let snapshot = snapshots
            .get(&item.product_id)
            .ok_or_else(|| CheckoutError::ProductNotFound {
                product_id: item.product_id.clone(),
            })?;

        let running = requested.entry(snapshot.product_id.as_str()).or_insert_with(|| {
            first_seen.push(snapshot);
            0
        });
        *running = running
            .checked_add(item.quantity)
            .ok_or_else(|| overflow("quantity"))?;

        if *running > snapshot.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: snapshot.product_id.clone(),
                available: snapshot.stock,
                requested: *running,
            });
        }

        let unit_price = snapshot.price();
        let subtotal = unit_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| overflow("subtotal"))?;
        total_amount = total_amount
            .checked_add(subtotal)
            .ok_or_else(|| overflow("total_amount"))?;

        lines.push(PricedLine {
            product_id: snapshot.product_id.clone(),
            product_name: snapshot.name.clone(),
            quantity: item.quantity,
            unit_price,
            subtotal,
        });
    }

    let grand_total = total_amount - discount;
    if grand_total.is_negative() {
        return Err(CheckoutError::InvalidDiscount {
            total: total_amount,
            discount,
        });
    }

    let change = cash - grand_total;
    if change.is_negative() {
        return Err(CheckoutError::PaymentInsufficient { grand_total, cash });
    }

    let mutations = first_seen
        .into_iter()
        .map(|snapshot| {
            let qty = requested[snapshot.product_id.as_str()];
            StockMutation {
                product_id: snapshot.product_id.clone(),
                snapshot_stock: snapshot.stock,
                new_stock: snapshot.stock - qty,
            }
        })
        .collect();

    Ok(PricedBasket {
        lines,
        total_amount,
        discount,
        grand_total,
        cash,
        change,
        mutations,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
