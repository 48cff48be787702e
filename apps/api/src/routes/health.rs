//! Liveness and database health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// GET / - 200 when the database answers, 503 otherwise.
pub async fn check(State(state): State<AppState>) -> Response {
    let healthy = state.db.health_check().await;

    let health = Health {
        status: if healthy { "ok" } else { "degraded" },
        database: if healthy { "ok" } else { "unreachable" },
        version: env!("CARGO_PKG_VERSION"),
    };

    if healthy {
        ApiResponse::ok("Tally POS API is running", health)
    } else {
        ApiResponse::with_status(StatusCode::SERVICE_UNAVAILABLE, "Database unreachable", health)
    }
}
