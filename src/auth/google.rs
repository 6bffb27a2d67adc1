//! Google ID token verification
//!
//! Verifies an id_token against Google's tokeninfo endpoint and checks the
//! audience against our configured client id. Any verification failure
//! (expired, malformed, wrong audience, endpoint unreachable) surfaces as
//! an auth provider error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Bound on the synchronous dependency on Google
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims extracted from a verified Google id_token
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    /// Audience (must match our client id)
    pub aud: String,
    /// Stable subject id for the Google account
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleClaims {
    /// Display name, falling back to the mailbox part of the email
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or("user")
                .to_string(),
        }
    }
}

/// Seam for id_token verification, so the auth service never depends on the
/// network directly (same shape as the `Mailer` seam).
#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    /// Verify an id_token, returning its claims
    async fn verify(&self, id_token: &str) -> AppResult<GoogleClaims>;
}

/// Verifies Google id_tokens via the tokeninfo endpoint
#[derive(Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, client_id }
    }
}

#[async_trait]
impl GoogleTokenVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> AppResult<GoogleClaims> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AppError::AuthProvider("GOOGLE_CLIENT_ID not configured".to_string()))?;

        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("tokeninfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::AuthProvider(format!(
                "tokeninfo rejected the token: {}",
                response.status()
            )));
        }

        let claims: GoogleClaims = response
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("malformed tokeninfo response: {e}")))?;

        check_audience(&claims, client_id)?;
        Ok(claims)
    }
}

/// Reject tokens minted for a different OAuth client
fn check_audience(claims: &GoogleClaims, client_id: &str) -> AppResult<()> {
    if claims.aud != client_id {
        return Err(AppError::AuthProvider(format!(
            "audience mismatch: {}",
            claims.aud
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(aud: &str) -> GoogleClaims {
        GoogleClaims {
            aud: aud.to_string(),
            sub: "108357203947261958372".to_string(),
            email: "alice@gmail.com".to_string(),
            name: Some("Alice".to_string()),
            picture: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
        }
    }

    #[test]
    fn test_audience_check() {
        assert!(check_audience(&claims("my-client-id"), "my-client-id").is_ok());
        assert!(matches!(
            check_audience(&claims("someone-else"), "my-client-id"),
            Err(AppError::AuthProvider(_))
        ));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{
            "aud": "my-client-id",
            "sub": "108357203947261958372",
            "email": "alice@gmail.com",
            "email_verified": "true",
            "name": "Alice",
            "picture": "https://lh3.googleusercontent.com/a/photo",
            "exp": "1716239022"
        }"#;
        let parsed: GoogleClaims = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.sub, "108357203947261958372");
        assert_eq!(parsed.display_name(), "Alice");
    }

    #[test]
    fn test_display_name_falls_back_to_mailbox() {
        let mut c = claims("x");
        c.name = None;
        assert_eq!(c.display_name(), "alice");
        c.name = Some("   ".to_string());
        assert_eq!(c.display_name(), "alice");
    }

    #[tokio::test]
    async fn test_unconfigured_client_id_is_rejected() {
        let verifier = GoogleVerifier::new(None);
        assert!(matches!(
            verifier.verify("some-token").await,
            Err(AppError::AuthProvider(_))
        ));
    }
}
