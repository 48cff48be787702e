//! Category CRUD. Admin and manager only.

use axum::extract::{Path, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tally_core::catalog::{new_category, rename_category};
use tally_core::CategoryInput;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{require_roles, MANAGERS};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list).post(create))
        .route("/categories/{id}", get(get_by_id).put(update).delete(delete))
        .route_layer(middleware::from_fn(require_roles(MANAGERS)))
}

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Response> {
    let categories = state.db.categories().list().await?;
    Ok(ApiResponse::ok("Categories retrieved", categories))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    Ok(ApiResponse::ok("Category retrieved", category))
}

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Response> {
    let category = new_category(&input, Utc::now())?;
    let category = state.db.categories().insert(&category).await?;

    info!(id = %category.id, name = %category.name, "Category created");
    Ok(ApiResponse::created("Category created", category))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Response> {
    let existing = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    let category = rename_category(&existing, &input, Utc::now())?;
    state.db.categories().update(&category).await?;

    Ok(ApiResponse::ok("Category updated", category))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    state.db.categories().delete(&id).await?;

    info!(id = %id, "Category deleted");
    Ok(ApiResponse::ok("Category deleted", serde_json::Value::Null))
}
