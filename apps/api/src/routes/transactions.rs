//! Checkout and sales history.
//!
//! Any staff role may ring up a sale; only admins and managers read the
//! history.

use axum::extract::{Path, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tally_core::CheckoutRequest;
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_roles, CurrentUser, ALL_STAFF, MANAGERS};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let checkout_routes = Router::new()
        .route("/transactions", post(create))
        .route_layer(middleware::from_fn(require_roles(ALL_STAFF)));

    let history_routes = Router::new()
        .route("/transactions", get(list))
        .route("/transactions/{id}", get(get_by_id))
        .route_layer(middleware::from_fn(require_roles(MANAGERS)));

    checkout_routes.merge(history_routes)
}

/// POST /api/v1/transactions
///
/// The sale runs on its own task: if the client disconnects mid-request the
/// atomic apply still finishes (or rolls back) on its own.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(mut request): Json<CheckoutRequest>,
) -> ApiResult<Response> {
    request.cashier_id = Some(user.id);

    let checkout = state.checkout.clone();
    let sale = tokio::spawn(async move { checkout.process_sale(request).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Checkout task failed");
            ApiError::internal("Checkout task failed")
        })??;

    Ok(ApiResponse::created("Transaction created", sale))
}

/// GET /api/v1/transactions
pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    let sales = state.checkout.list_sales().await?;
    Ok(ApiResponse::ok("Transactions retrieved", sales))
}

/// GET /api/v1/transactions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let sale = state.checkout.get_sale(&id).await?;
    Ok(ApiResponse::ok("Transaction retrieved", sale))
}
