//! # tally-db: Database Layer for Tally POS
//!
//! This crate provides database access for the Tally POS back end.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (tally-api)          CheckoutService (tally-core)        │
//! │       │                                   │ dyn CheckoutStore          │
//! │       ▼                                   ▼                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CategoryRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 0001_initial │  │   │
//! │  │   │ WAL, FKs on   │    │ UserRepo      │    │ _schema.sql  │  │   │
//! │  │   │ busy timeout  │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH, default ./tally.db)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_core::CheckoutService;
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let checkout = CheckoutService::new(Arc::new(db.sales()));
//! let sale = checkout.process_sale(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{CategoryRepository, ProductRepository, SaleRepository, UserRepository};
