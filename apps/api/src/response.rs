//! Success response envelope.
//!
//! ```json
//! { "message": "Product created", "data": { ... } }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Response {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 Created with `data`.
    pub fn created(message: impl Into<String>, data: T) -> Response {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Response {
        let body = ApiResponse {
            message: message.into(),
            data,
        };
        (status, Json(body)).into_response()
    }
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
