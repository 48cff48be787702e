//! # Checkout Orchestrator
//!
//! Drives one sale from request to committed record.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► Calculating ──► Committing ──► Committed                │
//! │      │               │               │                                  │
//! │      └───────────────┴───────────────┴──────► Aborted                   │
//! │                                                                         │
//! │  Validating   empty basket, field rules, one snapshot read per product  │
//! │  Calculating  pricing::price_basket over those snapshots                │
//! │  Committing   store.atomic_apply(mutations, sale)                       │
//! │  Aborted      any error; nothing was written                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! No stock is cached between checkouts. Two checkouts may read the same
//! snapshot; the store's commit-time check admits one and rejects the other
//! with `StockConflict`. Retrying is left to the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::pricing::{price_basket, PricedBasket};
use crate::store::CheckoutStore;
use crate::types::{CheckoutRequest, ProductSnapshot, Sale, SaleLine};
use crate::validation::validate_checkout_request;

// =============================================================================
// Phases
// =============================================================================

/// Where a checkout is in its lifecycle. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Validating,
    Calculating,
    Committing,
    Committed,
    Aborted,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutPhase::Validating => "validating",
            CheckoutPhase::Calculating => "calculating",
            CheckoutPhase::Committing => "committing",
            CheckoutPhase::Committed => "committed",
            CheckoutPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Processes sales against an injected [`CheckoutStore`].
///
/// ## Usage
/// ```rust,ignore
/// let service = CheckoutService::new(Arc::new(db.sales()));
/// let sale = service.process_sale(request).await?;
/// println!("{} change {}", sale.code, sale.change());
/// ```
pub struct CheckoutService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CheckoutService<S> {
    fn clone(&self) -> Self {
        CheckoutService {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CheckoutStore + ?Sized> CheckoutService<S> {
    pub fn new(store: Arc<S>) -> Self {
        CheckoutService { store }
    }

    /// Validates, prices and commits a sale.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - the committed sale, lines included
    /// * `Err(CheckoutError)` - nothing was persisted
    pub async fn process_sale(&self, request: CheckoutRequest) -> CheckoutResult<Sale> {
        let started = Instant::now();
        let result = self.run(&request).await;

        match &result {
            Ok(sale) => info!(
                phase = %CheckoutPhase::Committed,
                sale_id = %sale.id,
                code = %sale.code,
                lines = sale.items.len(),
                grand_total = %sale.grand_total(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Sale committed"
            ),
            Err(err) => warn!(
                phase = %CheckoutPhase::Aborted,
                error = %err,
                retryable = err.is_retryable(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Checkout aborted"
            ),
        }

        result
    }

    async fn run(&self, request: &CheckoutRequest) -> CheckoutResult<Sale> {
        debug!(phase = %CheckoutPhase::Validating, lines = request.items.len(), "Checkout started");

        if request.items.is_empty() {
            return Err(CheckoutError::EmptyBasket);
        }
        validate_checkout_request(request)?;

        let snapshots = self.read_snapshots(request).await?;

        debug!(phase = %CheckoutPhase::Calculating, products = snapshots.len(), "Pricing basket");
        let basket = price_basket(
            &request.items,
            &snapshots,
            Money::from_cents(request.discount_cents),
            Money::from_cents(request.cash_cents),
        )?;

        let sale = build_sale(&basket, request, Utc::now());

        debug!(
            phase = %CheckoutPhase::Committing,
            code = %sale.code,
            mutations = basket.mutations.len(),
            "Applying sale"
        );
        let committed = self.store.atomic_apply(&basket.mutations, &sale).await?;

        Ok(committed)
    }

    /// One read per distinct product, in first-appearance order.
    async fn read_snapshots(
        &self,
        request: &CheckoutRequest,
    ) -> CheckoutResult<HashMap<String, ProductSnapshot>> {
        let mut snapshots = HashMap::new();

        for item in &request.items {
            if snapshots.contains_key(&item.product_id) {
                continue;
            }

            let snapshot = self
                .store
                .read_product(&item.product_id)
                .await
                .map_err(CheckoutError::PersistenceFailed)?
                .ok_or_else(|| CheckoutError::ProductNotFound {
                    product_id: item.product_id.clone(),
                })?;

            debug!(
                product_id = %snapshot.product_id,
                stock = snapshot.stock,
                price = %snapshot.price(),
                "Read product snapshot"
            );
            snapshots.insert(item.product_id.clone(), snapshot);
        }

        Ok(snapshots)
    }

    /// Loads one committed sale.
    pub async fn get_sale(&self, sale_id: &str) -> CheckoutResult<Sale> {
        self.store
            .get_sale(sale_id)
            .await
            .map_err(CheckoutError::PersistenceFailed)?
            .ok_or_else(|| CheckoutError::SaleNotFound {
                id: sale_id.to_string(),
            })
    }

    /// Lists committed sales, newest first.
    pub async fn list_sales(&self) -> CheckoutResult<Vec<Sale>> {
        self.store
            .list_sales()
            .await
            .map_err(CheckoutError::PersistenceFailed)
    }
}

// =============================================================================
// Sale Assembly
// =============================================================================

/// Generates a sale code: `INV-<yyyymmddHHMMSS>-<8 hex>`.
///
/// The random suffix keeps codes unique when several terminals commit in the
/// same second; the store's unique index is the final guard.
pub fn generate_sale_code(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "INV-{}-{}",
        now.format("%Y%m%d%H%M%S"),
        suffix[..8].to_uppercase()
    )
}

fn build_sale(basket: &PricedBasket, request: &CheckoutRequest, now: DateTime<Utc>) -> Sale {
    let sale_id = Uuid::new_v4().to_string();

    let items = basket
        .lines
        .iter()
        .enumerate()
        .map(|(position, line)| SaleLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.subtotal.cents(),
            position: position as i64,
        })
        .collect();

    Sale {
        id: sale_id,
        code: generate_sale_code(now),
        total_amount_cents: basket.total_amount.cents(),
        discount_cents: basket.discount.cents(),
        grand_total_cents: basket.grand_total.cents(),
        cash_cents: basket.cash.cents(),
        change_cents: basket.change.cents(),
        payment_method: request.payment_method.trim().to_string(),
        cashier_id: request.cashier_id.clone(),
        created_at: now,
        items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
