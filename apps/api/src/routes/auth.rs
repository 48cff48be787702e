//! Account registration and login.

use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::validation::{validate_password, validate_username};
use tally_core::User;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthError};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// POST /api/v1/auth/register
///
/// The first account becomes admin; later accounts are cashiers.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let username = req.username.trim().to_string();
    validate_username(&username)?;
    validate_password(&req.password)?;

    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))??;

    let user = state
        .db
        .users()
        .register(&username, &password_hash, full_name.as_deref(), Utc::now())
        .await?;

    info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");
    Ok(ApiResponse::created("User registered", user))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    let user = state.db.users().get_by_username(req.username.trim()).await?;

    let Some(user) = user else {
        warn!(username = %req.username, "Login for unknown user");
        return Err(AuthError::InvalidCredentials.into());
    };

    let password = req.password;
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::internal(format!("Verification task failed: {}", e)))?;

    if !verified {
        warn!(username = %user.username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.jwt.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: state.jwt.lifetime_secs(),
            user,
        },
    ))
}
