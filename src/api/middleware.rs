//! API Middleware
//!
//! Session authentication and request logging middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;

use super::AppState;

/// Authentication state resolved from a request's bearer token.
///
/// Handlers behind the session middleware only ever see the Authenticated
/// variant, carried as a `CurrentAccount` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { account_id: Uuid },
}

/// The caller identity for a protected request
#[derive(Debug, Clone, Copy)]
pub struct CurrentAccount {
    pub account_id: Uuid,
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the session for a request: signature, expiry, and the account
/// must all check out, and the account must still be active.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> AuthState {
    let Some(token) = bearer_token(headers) else {
        return AuthState::Unauthenticated;
    };

    let account_id = match state.tokens.verify_session(token) {
        Ok(account_id) => account_id,
        Err(_) => return AuthState::Unauthenticated,
    };

    match state.accounts().find_by_id(account_id).await {
        Ok(Some(account)) if account.is_active => AuthState::Authenticated { account_id },
        Ok(_) => AuthState::Unauthenticated,
        Err(e) => {
            tracing::error!("Session account lookup failed: {e}");
            AuthState::Unauthenticated
        }
    }
}

/// Reject unauthenticated requests; stash the caller identity otherwise
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    match resolve_session(&state, &headers).await {
        AuthState::Authenticated { account_id } => {
            request.extensions_mut().insert(CurrentAccount { account_id });
            Ok(next.run(request).await)
        }
        AuthState::Unauthenticated => Err(AppError::Unauthenticated.into_response()),
    }
}

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret.jwt.token".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(SENSITIVE_HEADERS.contains(&"cookie"));
        assert!(!SENSITIVE_HEADERS.contains(&"content-type"));
    }
}
