//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    // External collaborators
    #[error("Google token verification failed: {0}")]
    AuthProvider(String),

    #[error("Failed to send email: {0}")]
    Mail(String),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone()))
            }
            // Duplicate email. The original API reports this as a plain 400.
            AppError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, "email_taken", Some(msg.clone()))
            }

            // 401 Unauthorized
            // Never distinguishes "no such email" from "wrong password".
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid_token", None)
            }
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", None)
            }
            AppError::AuthProvider(msg) => {
                tracing::warn!("Auth provider rejection: {}", msg);
                (StatusCode::UNAUTHORIZED, "auth_provider_error", None)
            }

            // 403 Forbidden
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()))
            }

            // 500 Internal Server Error; detail goes to the log, not the client
            AppError::Mail(msg) => {
                tracing::error!("Mail send failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "mail_error", None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let message = match status {
            // Keep 5xx bodies generic
            StatusCode::INTERNAL_SERVER_ERROR => "Server Error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            message,
            error_code: error_code.to_string(),
            details: if status == StatusCode::INTERNAL_SERVER_ERROR {
                None
            } else {
                details
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_error_status_codes() {
        assert_eq!(status_of(AppError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::Conflict("taken".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("no".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::NotFound("gone".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::AuthProvider("aud".into())), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_server_errors_are_generic() {
        let response = AppError::Internal("pool exhausted".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        // Same message whether the email is unknown or the password is wrong
        assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid email or password");
    }
}
