//! Common test utilities

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use expense_tracker::api::AppState;
use expense_tracker::auth::{GoogleClaims, GoogleTokenVerifier, Mailer};
use expense_tracker::{AppResult, Config};

/// Connect to the test database and apply the schema. Returns `None` when
/// DATABASE_URL is not set, so the integration suite can skip instead of
/// failing on machines without Postgres.
pub async fn try_setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Schema is idempotent (IF NOT EXISTS throughout)
    for statement in include_str!("../../migrations/001_init.sql").split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .expect("Failed to apply schema");
        }
    }

    Some(pool)
}

/// Configuration for tests; no Google client, no SMTP
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expires_days: 7,
        google_client_id: None,
        smtp: None,
        mail_from: "Expense Tracker <no-reply@localhost>".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    }
}

pub fn test_state(pool: PgPool, mailer: Arc<dyn Mailer>) -> AppState {
    AppState::new(pool, test_config(), mailer)
}

/// State with a substituted Google verifier, for driving the sign-in flows
/// without the network
pub fn test_state_with_google(
    pool: PgPool,
    google: Arc<dyn GoogleTokenVerifier>,
    mailer: Arc<dyn Mailer>,
) -> AppState {
    let mut state = test_state(pool, mailer);
    state.google = google;
    state
}

/// Verifier that accepts any id_token and returns fixed claims
pub struct StaticGoogleVerifier {
    claims: GoogleClaims,
}

impl StaticGoogleVerifier {
    pub fn returning(claims: GoogleClaims) -> Arc<Self> {
        Arc::new(Self { claims })
    }
}

#[async_trait]
impl GoogleTokenVerifier for StaticGoogleVerifier {
    async fn verify(&self, _id_token: &str) -> AppResult<GoogleClaims> {
        Ok(self.claims.clone())
    }
}

/// Unique email per test so parallel tests never collide
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

/// A password-reset message captured in memory
pub struct SentMail {
    pub to: String,
    pub reset_url: String,
}

/// Mailer that records messages instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, _name: &str, reset_url: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            reset_url: reset_url.to_string(),
        });
        Ok(())
    }
}
