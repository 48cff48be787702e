//! Product CRUD. Admin and manager only.

use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tally_core::catalog::{new_product, update_product};
use tally_core::{PageRequest, ProductInput};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_roles, MANAGERS};
use crate::response::{ApiResponse, Page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(get_by_id).put(update).delete(delete))
        .route_layer(middleware::from_fn(require_roles(MANAGERS)))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/v1/products?page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let page = PageRequest::new(params.page, params.page_size);
    let repo = state.db.products();

    let items = repo.list(page).await?;
    let total = repo.count().await?;

    Ok(ApiResponse::ok(
        "Products retrieved",
        Page {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        },
    ))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(ApiResponse::ok("Product retrieved", product))
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Response> {
    let product = new_product(&input, Utc::now())?;
    let product = state.db.products().insert(&product).await?;

    info!(id = %product.id, sku = %product.sku, "Product created");
    Ok(ApiResponse::created("Product created", product))
}

/// PUT /api/v1/products/{id}
///
/// Replaces every field; a blank SKU keeps the current one.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Response> {
    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let product = update_product(&existing, &input, Utc::now())?;
    state.db.products().update(&product).await?;

    Ok(ApiResponse::ok("Product updated", product))
}

/// DELETE /api/v1/products/{id}
///
/// 409 when the product appears on a committed sale.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    state.db.products().delete(&id).await?;

    info!(id = %id, "Product deleted");
    Ok(ApiResponse::ok("Product deleted", serde_json::Value::Null))
}
