//! Shared application state.

use std::sync::Arc;

use tally_core::CheckoutService;
use tally_db::{Database, SaleRepository};

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state, cloned into every handler.
///
/// The checkout service holds the sale repository as its store; there is no
/// global connection.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub checkout: CheckoutService<SaleRepository>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        let checkout = CheckoutService::new(Arc::new(db.sales()));
        let jwt = Arc::new(JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs));

        AppState { db, checkout, jwt }
    }
}
