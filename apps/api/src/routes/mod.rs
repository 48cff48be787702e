//! HTTP routes, grouped by resource.
//!
//! | Path | Method | Roles |
//! |------|--------|-------|
//! | `/` | GET | public |
//! | `/api/v1/auth/register`, `/api/v1/auth/login` | POST | public |
//! | `/api/v1/products[/{id}]` | all | admin, manager |
//! | `/api/v1/categories[/{id}]` | all | admin, manager |
//! | `/api/v1/transactions` | POST | admin, manager, cashier |
//! | `/api/v1/transactions[/{id}]` | GET | admin, manager |

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod transactions;
