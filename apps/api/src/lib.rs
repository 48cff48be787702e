//! # Tally API
//!
//! HTTP server for the Tally POS back end.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Pipeline                               │
//! │                                                                         │
//! │  TraceLayer ──► /api/v1 ──► require_auth ──► require_roles ──► handler │
//! │                    │                                             │      │
//! │                    └── /auth/* (public)                          ▼      │
//! │                                          Database repos / CheckoutService│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./tally.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - secret for token signing
//! - `JWT_LIFETIME_SECS` - token lifetime (default: 259200, 72 hours)
//! - `RUST_LOG` - log filter (default: `info,tally=debug,sqlx=warn`)

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::products::router())
        .merge(routes::categories::router())
        .merge(routes::transactions::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let api = Router::new().merge(routes::auth::router()).merge(protected);

    Router::new()
        .route("/", get(routes::health::check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
