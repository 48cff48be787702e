//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Development-only signing secret used when `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "tally-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds (default: 72 hours)
    pub jwt_lifetime_secs: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_var("HTTP_PORT", "8080")?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./tally.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }),

            jwt_lifetime_secs: parse_var("JWT_LIFETIME_SECS", "259200")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
