//! # Seed Data Generator
//!
//! Populates the database with categories and products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! Each product gets:
//! - SKU: `{CATEGORY}-{NAME}-{INDEX}`
//! - Price: $1.99 - $9.99 plus a size addon
//! - Cost: 60-80% of price
//! - Stock: 0 - 100

use std::env;

use chrono::Utc;
use tally_core::catalog::{new_category, new_product};
use tally_core::{CategoryInput, ProductInput};
use tally_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Category name, SKU prefix, product names.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Beverages",
        "BEV",
        &[
            "Coca-Cola",
            "Sprite",
            "Mineral Water",
            "Orange Juice",
            "Iced Tea",
            "Coffee",
            "Green Tea",
            "Lemonade",
        ],
    ),
    (
        "Snacks",
        "SNK",
        &[
            "Potato Chips",
            "Tortilla Chips",
            "Peanuts",
            "Chocolate Bar",
            "Wafer Roll",
            "Crackers",
            "Cookies",
        ],
    ),
    (
        "Dairy",
        "DRY",
        &["Fresh Milk", "Yogurt", "Cheddar Cheese", "Butter", "Condensed Milk"],
    ),
    (
        "Grocery",
        "GRO",
        &[
            "Jasmine Rice",
            "Instant Noodles",
            "Cooking Oil",
            "Sugar",
            "Wheat Flour",
            "Soy Sauce",
            "Canned Sardines",
        ],
    ),
    (
        "Household",
        "HSE",
        &["Dish Soap", "Laundry Detergent", "Tissue Roll", "Trash Bags"],
    ),
];

/// Size variants and their price addon in cents.
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 100), ("Large", 250), ("Family", 500)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./tally.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'categories: for (category_name, code, names) in CATEGORIES {
        let category = new_category(
            &CategoryInput {
                name: category_name.to_string(),
            },
            Utc::now(),
        )?;
        let category = db.categories().insert(&category).await?;

        for name in names.iter() {
            for (size, price_addon) in SIZES {
                if generated >= count {
                    break 'categories;
                }

                let input = product_input(&category.id, code, name, size, *price_addon, generated);
                let product = new_product(&input, Utc::now())?;

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!("  Categories: {}", db.categories().count().await?);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds a product input with deterministic pseudo-random price and stock.
fn product_input(
    category_id: &str,
    code: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> ProductInput {
    let name_code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", code, name_code, seed);

    let price_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;
    let cost_pct = 60 + (seed % 20) as i64;

    ProductInput {
        name: format!("{} {}", name, size),
        sku: Some(sku),
        description: None,
        price_cents,
        cost_cents: price_cents * cost_pct / 100,
        stock: (seed % 101) as i64,
        category_id: category_id.to_string(),
    }
}
