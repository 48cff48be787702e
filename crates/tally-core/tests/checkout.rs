//! Checkout orchestrator tests against an in-memory store.
//!
//! The store applies a sale by validating every mutation against its current
//! stock and then swapping in the new state under one lock, which gives the
//! same all-or-nothing behavior the SQLite store gets from a transaction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use tally_core::{
    CheckoutError, CheckoutRequest, CheckoutService, CheckoutStore, LineItemRequest,
    ProductSnapshot, Sale, StockMutation, StoreError,
};

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Clone, Default, PartialEq, Debug)]
struct State {
    products: HashMap<String, ProductSnapshot>,
    sales: Vec<Sale>,
}

#[derive(Default)]
struct MemoryStore {
    state: Mutex<State>,
    reads: AtomicUsize,
    /// Fail after the stock writes but before the sale is recorded.
    fail_sale_insert: AtomicBool,
    /// Fail every read.
    fail_reads: AtomicBool,
    /// Holds each read until this many reads have happened.
    read_barrier: Option<Arc<Barrier>>,
}

impl MemoryStore {
    fn with_products(products: &[(&str, i64, i64)]) -> Self {
        let store = MemoryStore::default();
        {
            let mut state = store.state.lock().unwrap();
            for (id, price, stock) in products {
                state.products.insert(
                    id.to_string(),
                    ProductSnapshot {
                        product_id: id.to_string(),
                        name: format!("Product {}", id),
                        price_cents: *price,
                        stock: *stock,
                    },
                );
            }
        }
        store
    }

    fn with_barrier(mut self, parties: usize) -> Self {
        self.read_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    fn stock(&self, id: &str) -> i64 {
        self.state.lock().unwrap().products[id].stock
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn read_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("database is locked".to_string()));
        }

        let snapshot = self.state.lock().unwrap().products.get(product_id).cloned();

        if let Some(barrier) = &self.read_barrier {
            barrier.wait().await;
        }

        Ok(snapshot)
    }

    async fn atomic_apply(&self, mutations: &[StockMutation], sale: &Sale) -> Result<Sale, StoreError> {
        let mut state = self.state.lock().unwrap();
        let mut next = state.clone();

        for mutation in mutations {
            let product = next
                .products
                .get_mut(&mutation.product_id)
                .ok_or_else(|| StoreError::StockConflict {
                    product_id: mutation.product_id.clone(),
                })?;
            let remaining = product.stock - mutation.quantity();
            if remaining < 0 {
                return Err(StoreError::StockConflict {
                    product_id: mutation.product_id.clone(),
                });
            }
            product.stock = remaining;
        }

        if self.fail_sale_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk I/O error".to_string()));
        }
        if next.sales.iter().any(|s| s.code == sale.code) {
            return Err(StoreError::UniqueViolation {
                field: "sales.code".to_string(),
            });
        }

        next.sales.push(sale.clone());
        *state = next;
        Ok(sale.clone())
    }

    async fn get_sale(&self, sale_id: &str) -> Result<Option<Sale>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sales
            .iter()
            .find(|s| s.id == sale_id)
            .cloned())
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError> {
        let mut sales = self.state.lock().unwrap().sales.clone();
        sales.reverse();
        Ok(sales)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn line(product_id: &str, quantity: i64) -> LineItemRequest {
    LineItemRequest {
        product_id: product_id.to_string(),
        quantity,
    }
}

fn request(items: Vec<LineItemRequest>, cash_cents: i64, discount_cents: i64) -> CheckoutRequest {
    CheckoutRequest {
        payment_method: "Cash".to_string(),
        cash_cents,
        discount_cents,
        items,
        cashier_id: Some("cashier-1".to_string()),
    }
}

fn service(store: &Arc<MemoryStore>) -> CheckoutService<MemoryStore> {
    CheckoutService::new(Arc::clone(store))
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_single_line_sale_commits() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 500, 10)]));

    let sale = service(&store)
        .process_sale(request(vec![line("p", 3)], 2000, 0))
        .await
        .unwrap();

    assert_eq!(sale.total_amount_cents, 1500);
    assert_eq!(sale.grand_total_cents, 1500);
    assert_eq!(sale.change_cents, 500);
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].unit_price_cents, 500);
    assert_eq!(sale.items[0].product_name, "Product p");
    assert_eq!(sale.cashier_id.as_deref(), Some("cashier-1"));
    assert!(sale.code.starts_with("INV-"));
    assert_eq!(store.stock("p"), 7);
    assert_eq!(store.snapshot().sales.len(), 1);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_stock_untouched() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 500, 2)]));

    let err = service(&store)
        .process_sale(request(vec![line("p", 5)], 10_000, 0))
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            product_id,
            available,
            requested,
        } => {
            assert_eq!(product_id, "p");
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.stock("p"), 2);
}

#[tokio::test]
async fn test_discount_above_total_is_rejected() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 5000, 10)]));
    let before = store.snapshot();

    let err = service(&store)
        .process_sale(request(vec![line("p", 1)], 10_000, 6000))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InvalidDiscount { .. }));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_underpayment_is_rejected() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 10)]));
    let before = store.snapshot();

    let err = service(&store)
        .process_sale(request(vec![line("p", 3)], 2000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentInsufficient { .. }));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_concurrent_checkouts_for_last_unit() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 1)]).with_barrier(2));
    let svc = service(&store);

    // Both reads complete before either apply runs.
    let (a, b) = tokio::join!(
        svc.process_sale(request(vec![line("p", 1)], 1000, 0)),
        svc.process_sale(request(vec![line("p", 1)], 1000, 0)),
    );

    let results = [a, b];
    let committed = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::StockConflict { product_id }) if product_id == "p"))
        .count();

    assert_eq!(committed, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(store.stock("p"), 0);
    assert_eq!(store.snapshot().sales.len(), 1);
}

#[tokio::test]
async fn test_duplicate_lines_are_checked_together() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 100, 6)]));

    let err = service(&store)
        .process_sale(request(vec![line("p", 3), line("p", 4)], 10_000, 0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock { available: 6, requested: 7, .. }
    ));
    assert_eq!(store.stock("p"), 6);
    // one snapshot read for the product, not one per line
    assert_eq!(store.reads.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_conservation_across_mixed_basket() {
    let store = Arc::new(MemoryStore::with_products(&[("a", 1000, 10), ("b", 500, 5), ("c", 250, 4)]));
    let before = store.snapshot();

    let sale = service(&store)
        .process_sale(request(
            vec![line("a", 2), line("b", 3), line("a", 1), line("c", 4)],
            10_000,
            700,
        ))
        .await
        .unwrap();

    let sum: i64 = sale.items.iter().map(|l| l.subtotal_cents).sum();
    assert_eq!(sum, sale.total_amount_cents);
    assert_eq!(sale.total_amount_cents, 3000 + 1500 + 1000);
    assert_eq!(sale.grand_total_cents, sale.total_amount_cents - sale.discount_cents);
    assert_eq!(sale.change_cents, sale.cash_cents - sale.grand_total_cents);
    for l in &sale.items {
        assert_eq!(l.subtotal_cents, l.quantity * l.unit_price_cents);
    }

    assert_eq!(store.stock("a"), before.products["a"].stock - 3);
    assert_eq!(store.stock("b"), before.products["b"].stock - 3);
    assert_eq!(store.stock("c"), 0);

    let positions: Vec<i64> = sale.items.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_failed_commit_leaves_no_trace() {
    let store = Arc::new(MemoryStore::with_products(&[("a", 1000, 10), ("b", 500, 5)]));
    store.fail_sale_insert.store(true, Ordering::SeqCst);
    let before = store.snapshot();

    let err = service(&store)
        .process_sale(request(vec![line("a", 1), line("b", 1)], 5000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PersistenceFailed(StoreError::Backend(_))));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_every_rejection_leaves_state_unchanged() {
    let store = Arc::new(MemoryStore::with_products(&[("a", 1000, 3)]));
    let svc = service(&store);
    let before = store.snapshot();

    let rejected = vec![
        request(vec![], 1000, 0),
        request(vec![line("ghost", 1)], 1000, 0),
        request(vec![line("a", 4)], 10_000, 0),
        request(vec![line("a", 0)], 10_000, 0),
        request(vec![line("a", 1)], 1000, 1001),
        request(vec![line("a", 2)], 1999, 0),
    ];

    for req in rejected {
        assert!(svc.process_sale(req).await.is_err());
        assert_eq!(store.snapshot(), before);
    }
}

#[tokio::test]
async fn test_retry_after_conflict_uses_fresh_stock() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 1)]).with_barrier(2));
    let svc = service(&store);

    let (a, b) = tokio::join!(
        svc.process_sale(request(vec![line("p", 1)], 5000, 0)),
        svc.process_sale(request(vec![line("p", 1)], 5000, 0)),
    );
    let loser = (if a.is_ok() { b } else { a }).unwrap_err();
    assert!(loser.is_retryable());

    // Same basket against refreshed stock, on a store without the read barrier.
    let refreshed = Arc::new(MemoryStore::default());
    *refreshed.state.lock().unwrap() = store.snapshot();
    let retry = service(&refreshed)
        .process_sale(request(vec![line("p", 1)], 5000, 0))
        .await;

    assert!(matches!(
        retry,
        Err(CheckoutError::InsufficientStock { available: 0, requested: 1, .. })
    ));
    assert_eq!(refreshed.snapshot().sales.len(), 1);
    assert_eq!(refreshed.stock("p"), 0);
}

#[tokio::test]
async fn test_read_failure_is_persistence_failure() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 2)]));
    store.fail_reads.store(true, Ordering::SeqCst);

    let err = service(&store)
        .process_sale(request(vec![line("p", 1)], 5000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PersistenceFailed(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_empty_basket_reads_nothing() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 2)]));

    let err = service(&store)
        .process_sale(request(vec![], 5000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyBasket));
    assert_eq!(store.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_get_and_list_sales() {
    let store = Arc::new(MemoryStore::with_products(&[("p", 1000, 10)]));
    let svc = service(&store);

    let first = svc.process_sale(request(vec![line("p", 1)], 1000, 0)).await.unwrap();
    let second = svc.process_sale(request(vec![line("p", 2)], 2000, 0)).await.unwrap();

    assert_eq!(svc.get_sale(&first.id).await.unwrap(), first);
    let listed = svc.list_sales().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);

    let err = svc.get_sale("missing").await.unwrap_err();
    assert!(matches!(err, CheckoutError::SaleNotFound { ref id } if id == "missing"));
}
