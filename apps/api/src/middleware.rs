//! Authentication and role middleware.
//!
//! ```text
//! request ──► require_auth ──► require_roles(&[..]) ──► handler
//!               │ 401               │ 403
//!               ▼                   ▼
//!        inserts CurrentUser   reads CurrentUser
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! Router::new()
//!     .route("/products", get(list))
//!     .route_layer(middleware::from_fn(require_roles(MANAGERS)))
//!     .route_layer(middleware::from_fn_with_state(state, require_auth));
//! ```

use std::future::Future;
use std::pin::Pin;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tally_core::Role;
use tracing::{debug, warn};

use crate::auth::{extract_bearer_token, AuthError, Claims};
use crate::error::ApiError;
use crate::state::AppState;

/// Catalogue and sales-history access.
pub const MANAGERS: &[Role] = &[Role::Admin, Role::Manager];

/// Every authenticated role; ringing up sales.
pub const ALL_STAFF: &[Role] = &[Role::Admin, Role::Manager, Role::Cashier];

/// The authenticated caller, available to handlers as
/// `Extension<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = claims.role.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(CurrentUser {
            id: claims.sub,
            username: claims.username,
            role,
        })
    }
}

/// Requires a valid `Authorization: Bearer <token>` header.
///
/// On success inserts [`CurrentUser`] into the request extensions.
///
/// | Failure | Status |
/// |---------|--------|
/// | No header | 401 |
/// | Not a bearer token | 401 |
/// | Bad signature / expired | 401 |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(header) => extract_bearer_token(header).ok_or(AuthError::InvalidToken)?,
        None => {
            debug!(uri = %req.uri(), "Request without authorization header");
            return Err(AuthError::MissingToken.into());
        }
    };

    let claims = state.jwt.validate(token).map_err(|e| {
        warn!(uri = %req.uri(), error = %e, "Token rejected");
        e
    })?;

    let user = CurrentUser::try_from(claims)?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Requires the authenticated user to hold one of `roles`.
///
/// Must run after [`require_auth`]; a request without [`CurrentUser`] is
/// treated as unauthenticated.
pub fn require_roles(
    roles: &'static [Role],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>> + Clone
{
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

            if !roles.contains(&user.role) {
                warn!(
                    user_id = %user.id,
                    username = %user.username,
                    role = %user.role,
                    "Role not permitted"
                );
                return Err(ApiError::forbidden(format!(
                    "Role {} is not permitted to perform this action",
                    user.role
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
