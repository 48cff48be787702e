//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                    CheckoutService                       │
//! │       │                                │                               │
//! │       │ db.products().list(page)       │ store.atomic_apply(..)        │
//! │       ▼                                ▼                               │
//! │  ProductRepository               SaleRepository (CheckoutStore)        │
//! │  CategoryRepository                    │                               │
//! │  UserRepository                        │                               │
//! │       │           SQL                  │                               │
//! │       └──────────────┬─────────────────┘                               │
//! │                      ▼                                                  │
//! │               SQLite Database                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`] - Category CRUD
//! - [`ProductRepository`] - Product CRUD and paging
//! - [`UserRepository`] - Account registration and lookup
//! - [`SaleRepository`] - Atomic sale apply and sale history

pub mod category;
pub mod product;
pub mod sale;
pub mod user;

pub use category::CategoryRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
pub use user::UserRepository;
