//! Token service
//!
//! Issues and verifies bearer session tokens, and manages the single-use,
//! time-boxed password-reset secrets. Session tokens are stateless HS256
//! JWTs; logout is client-side token discard.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reset secrets are valid for one hour
const RESET_SECRET_TTL_MINUTES: i64 = 60;

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Account id
    sub: Uuid,
    /// Issued-at (seconds since epoch)
    iat: i64,
    /// Expiry (seconds since epoch)
    exp: i64,
}

/// A freshly issued password-reset secret.
///
/// The plaintext goes to the user out-of-band; only the hash is persisted.
#[derive(Debug, Clone)]
pub struct ResetSecret {
    pub plain: String,
    pub hash: String,
    pub expires: DateTime<Utc>,
}

/// Issues and verifies session tokens and reset secrets
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_days: i64,
}

impl TokenService {
    pub fn new(secret: &str, expires_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_days,
        }
    }

    /// Issue a signed session token for an account
    pub fn issue_session(&self, account_id: Uuid) -> AppResult<String> {
        self.issue_session_at(account_id, Utc::now())
    }

    fn issue_session_at(&self, account_id: Uuid, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = SessionClaims {
            sub: account_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::days(self.expires_days)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a session token, returning the account id it was issued for.
    ///
    /// Fails with `InvalidToken` on bad signature, malformed payload, or
    /// elapsed expiry.
    pub fn verify_session(&self, token: &str) -> AppResult<Uuid> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims.sub)
    }

    /// Generate a high-entropy reset secret with its stored hash and expiry
    pub fn issue_reset_secret(&self) -> ResetSecret {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plain = hex::encode(bytes);
        let hash = Self::hash_reset_secret(&plain);
        ResetSecret {
            plain,
            hash,
            expires: Utc::now() + Duration::minutes(RESET_SECRET_TTL_MINUTES),
        }
    }

    /// One-way hash of a reset secret, used as the lookup key
    pub fn hash_reset_secret(plain: &str) -> String {
        hex::encode(Sha256::digest(plain.as_bytes()))
    }

    /// Check a supplied plaintext against a stored hash and expiry.
    ///
    /// Store-independent form of the predicate `AccountStore::find_by_reset_hash`
    /// evaluates in SQL (hash match plus unexpired window), for callers that
    /// already hold the account row.
    ///
    /// The comparison is over fixed-length digests, so timing does not scale
    /// with where the inputs differ.
    pub fn verify_reset_secret(
        plain: &str,
        stored_hash: &str,
        expires: DateTime<Utc>,
    ) -> bool {
        Utc::now() < expires && Self::hash_reset_secret(plain) == stored_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 7)
    }

    #[test]
    fn test_session_round_trip() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.issue_session(id).unwrap();
        assert_eq!(svc.verify_session(&token).unwrap(), id);
    }

    #[test]
    fn test_expired_session_rejected() {
        let svc = service();
        let id = Uuid::new_v4();
        // Issued 8 days ago with a 7 day lifetime (past the validation leeway)
        let token = svc
            .issue_session_at(id, Utc::now() - Duration::days(8))
            .unwrap();
        assert!(matches!(
            svc.verify_session(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue_session(Uuid::new_v4()).unwrap();
        let other = TokenService::new("another-secret", 7);
        assert!(matches!(
            other.verify_session(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().verify_session("not.a.jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_reset_secret_matches_its_hash() {
        let secret = service().issue_reset_secret();
        assert_eq!(secret.plain.len(), 64);
        assert!(TokenService::verify_reset_secret(
            &secret.plain,
            &secret.hash,
            secret.expires
        ));
    }

    #[test]
    fn test_reset_secret_wrong_plaintext() {
        let secret = service().issue_reset_secret();
        assert!(!TokenService::verify_reset_secret(
            "0000",
            &secret.hash,
            secret.expires
        ));
    }

    #[test]
    fn test_reset_secret_expired() {
        let secret = service().issue_reset_secret();
        // Correct plaintext, but the expiry has elapsed
        assert!(!TokenService::verify_reset_secret(
            &secret.plain,
            &secret.hash,
            Utc::now() - Duration::seconds(1)
        ));
    }

    #[test]
    fn test_reset_secrets_are_unique() {
        let svc = service();
        let a = svc.issue_reset_secret();
        let b = svc.issue_reset_secret();
        assert_ne!(a.plain, b.plain);
        assert_ne!(a.hash, b.hash);
    }
}
