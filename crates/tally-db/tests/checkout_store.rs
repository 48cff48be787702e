//! Checkout against the SQLite store: the atomic apply, append-only sales
//! and concurrent sales of the last unit.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tally_core::catalog::{new_category, new_product};
use tally_core::checkout::generate_sale_code;
use tally_core::{
    CategoryInput, CheckoutError, CheckoutRequest, CheckoutService, LineItemRequest, Product,
    ProductInput, Sale, StockMutation,
};
use tally_db::{Database, DbConfig, DbError};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    let category = match db.categories().list().await.unwrap().into_iter().next() {
        Some(category) => category,
        None => {
            let category = new_category(
                &CategoryInput {
                    name: "General".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
            db.categories().insert(&category).await.unwrap()
        }
    };

    let product = new_product(
        &ProductInput {
            name: name.to_string(),
            sku: None,
            description: None,
            price_cents,
            cost_cents: 0,
            stock,
            category_id: category.id,
        },
        Utc::now(),
    )
    .unwrap();
    db.products().insert(&product).await.unwrap()
}

fn request(items: &[(&str, i64)], cash_cents: i64) -> CheckoutRequest {
    CheckoutRequest {
        payment_method: "Cash".to_string(),
        cash_cents,
        discount_cents: 0,
        items: items
            .iter()
            .map(|(id, qty)| LineItemRequest {
                product_id: id.to_string(),
                quantity: *qty,
            })
            .collect(),
        cashier_id: None,
    }
}

fn empty_sale(total_cents: i64) -> Sale {
    let now = Utc::now();
    Sale {
        id: uuid::Uuid::new_v4().to_string(),
        code: generate_sale_code(now),
        total_amount_cents: total_cents,
        discount_cents: 0,
        grand_total_cents: total_cents,
        cash_cents: total_cents,
        change_cents: 0,
        payment_method: "Cash".to_string(),
        cashier_id: None,
        created_at: now,
        items: Vec::new(),
    }
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn test_checkout_commits_sale_and_decrements_stock() {
    let db = setup().await;
    let product = seed_product(&db, "Coca-Cola", 500, 10).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));

    let sale = checkout
        .process_sale(request(&[(product.id.as_str(), 3)], 2000))
        .await
        .unwrap();

    assert_eq!(sale.total_amount_cents, 1500);
    assert_eq!(sale.change_cents, 500);
    assert_eq!(stock_of(&db, &product.id).await, 7);

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.code, sale.code);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].product_name, "Coca-Cola");
    assert_eq!(stored.items[0].subtotal_cents, 1500);
}

#[tokio::test]
async fn test_failed_mutation_rolls_back_earlier_decrements() {
    let db = setup().await;
    let plenty = seed_product(&db, "Mineral Water", 300, 10).await;
    let scarce = seed_product(&db, "Iced Tea", 400, 1).await;

    let mutations = vec![
        StockMutation {
            product_id: plenty.id.clone(),
            snapshot_stock: 10,
            new_stock: 8,
        },
        StockMutation {
            product_id: scarce.id.clone(),
            snapshot_stock: 3,
            new_stock: 0,
        },
    ];

    let result = db.sales().apply_sale(&mutations, &empty_sale(1800)).await;
    match result {
        Err(DbError::StockConflict { product_id }) => assert_eq!(product_id, scarce.id),
        other => panic!("expected stock conflict, got {:?}", other),
    }

    assert_eq!(stock_of(&db, &plenty.id).await, 10);
    assert_eq!(stock_of(&db, &scarce.id).await, 1);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_vanished_product_is_stock_conflict() {
    let db = setup().await;

    let mutations = vec![StockMutation {
        product_id: "deleted-product".to_string(),
        snapshot_stock: 5,
        new_stock: 4,
    }];

    assert!(matches!(
        db.sales().apply_sale(&mutations, &empty_sale(100)).await,
        Err(DbError::StockConflict { .. })
    ));
}

#[tokio::test]
async fn test_insufficient_stock_writes_nothing() {
    let db = setup().await;
    let product = seed_product(&db, "Peanuts", 250, 2).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));

    let err = checkout
        .process_sale(request(&[(product.id.as_str(), 5)], 10_000))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            available: 2,
            requested: 5,
            ..
        }
    ));
    assert_eq!(stock_of(&db, &product.id).await, 2);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sales_are_append_only() {
    let db = setup().await;
    let product = seed_product(&db, "Butter", 900, 5).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));
    let sale = checkout
        .process_sale(request(&[(product.id.as_str(), 1)], 900))
        .await
        .unwrap();

    let update = sqlx::query("UPDATE sales SET cash_cents = 0 WHERE id = ?1")
        .bind(&sale.id)
        .execute(db.pool())
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
        .bind(&sale.id)
        .execute(db.pool())
        .await;
    assert!(delete.is_err());

    assert_eq!(db.sales().get_by_id(&sale.id).await.unwrap().unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_product_on_a_sale_cannot_be_deleted() {
    let db = setup().await;
    let product = seed_product(&db, "Cheddar Cheese", 1200, 5).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));
    checkout
        .process_sale(request(&[(product.id.as_str(), 1)], 1200))
        .await
        .unwrap();

    assert!(matches!(
        db.products().delete(&product.id).await,
        Err(DbError::ForeignKeyViolation { .. })
    ));
}

#[tokio::test]
async fn test_list_sales_newest_first_with_lines() {
    let db = setup().await;
    let a = seed_product(&db, "Sugar", 150, 20).await;
    let b = seed_product(&db, "Wheat Flour", 200, 20).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));

    let first = checkout
        .process_sale(request(&[(a.id.as_str(), 1)], 150))
        .await
        .unwrap();
    let second = checkout
        .process_sale(request(&[(a.id.as_str(), 2), (b.id.as_str(), 1)], 1000))
        .await
        .unwrap();

    let sales = checkout.list_sales().await.unwrap();
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].id, second.id);
    assert_eq!(sales[1].id, first.id);
    assert_eq!(sales[0].items.len(), 2);
    assert_eq!(sales[0].items[0].position, 0);
    assert_eq!(sales[0].items[1].product_id, b.id);
    assert_eq!(sales[1].items.len(), 1);
}

#[tokio::test]
async fn test_missing_sale_is_not_found() {
    let db = setup().await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));

    assert!(matches!(
        checkout.get_sale("no-such-sale").await,
        Err(CheckoutError::SaleNotFound { .. })
    ));
}

// =============================================================================
// Concurrency (file-backed, multiple connections)
// =============================================================================

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("tally-test-{}.db", uuid::Uuid::new_v4()))
}

fn remove_db_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sales_of_last_unit() {
    let path = temp_db_path();
    let db = Database::new(DbConfig::new(&path).max_connections(4))
        .await
        .unwrap();
    let product = seed_product(&db, "Family Pack", 1000, 1).await;
    let checkout = CheckoutService::new(Arc::new(db.sales()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let checkout = checkout.clone();
        let id = product.id.clone();
        handles.push(tokio::spawn(async move {
            checkout.process_sale(request(&[(id.as_str(), 1)], 1000)).await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(CheckoutError::StockConflict { .. })
            | Err(CheckoutError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(stock_of(&db, &product.id).await, 0);
    assert_eq!(db.sales().count().await.unwrap(), 1);

    db.close().await;
    remove_db_files(&path);
}
