//! JWT authentication module.
//!
//! Token issuing and validation, and password hashing.
//!
//! ## Token Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /auth/login ──► verify_password ──► JwtManager::issue            │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                              { sub, username, role, iat, exp, jti }     │
//! │                                              │  HS256                   │
//! │                                              ▼                          │
//! │  Authorization: Bearer <token> ──► require_auth ──► CurrentUser         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tally_core::User;
use uuid::Uuid;

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Signing or hashing failed. Never caused by client input.
    #[error("Authentication backend error: {0}")]
    Internal(String),
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    /// Role name; parsed case-insensitively on the way back in
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issue an access token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> =
            decode(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header. The scheme is matched
/// case-insensitively.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
