//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secret used to sign session tokens
    pub jwt_secret: String,

    /// Session token lifetime in days
    pub jwt_expires_days: i64,

    /// Google OAuth client id; google-auth is rejected when unset
    pub google_client_id: Option<String>,

    /// SMTP settings; forgot-password fails with a mail error when unset
    pub smtp: Option<SmtpConfig>,

    /// Sender address for outgoing mail
    pub mail_from: String,

    /// Base URL of the SPA, used to build reset-password links
    pub frontend_url: String,
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingEnv("JWT_SECRET"))?;

        let jwt_expires_days = env::var("JWT_EXPIRES_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("JWT_EXPIRES_DAYS"))?;

        let google_client_id = env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty());

        let smtp = match env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()) {
            Some(smtp_host) => {
                let smtp_port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("SMTP_PORT"))?;
                Some(SmtpConfig {
                    host: smtp_host,
                    port: smtp_port,
                    username: env::var("SMTP_USER").unwrap_or_default(),
                    password: env::var("SMTP_PASS").unwrap_or_default(),
                })
            }
            None => None,
        };

        let mail_from = env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Expense Tracker <no-reply@localhost>".to_string());

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            jwt_expires_days,
            google_client_id,
            smtp,
            mail_from,
            frontend_url,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
