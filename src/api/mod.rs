//! API module
//!
//! HTTP API endpoints, middleware, and shared state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthService, GoogleTokenVerifier, GoogleVerifier, Mailer};
use crate::config::Config;
use crate::store::{AccountStore, TransactionStore};
use crate::token::TokenService;

pub mod middleware;
pub mod routes;

pub use routes::create_router;

/// Shared application state, constructed once at startup and injected into
/// every handler. Configuration is never read from the ambient environment
/// after this point.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub google: Arc<dyn GoogleTokenVerifier>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expires_days);
        let google: Arc<dyn GoogleTokenVerifier> =
            Arc::new(GoogleVerifier::new(config.google_client_id.clone()));
        Self {
            pool,
            config: Arc::new(config),
            tokens,
            google,
            mailer,
        }
    }

    pub fn accounts(&self) -> AccountStore {
        AccountStore::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionStore {
        TransactionStore::new(self.pool.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.accounts(),
            self.tokens.clone(),
            self.google.clone(),
            self.mailer.clone(),
            self.config.frontend_url.clone(),
        )
    }
}
