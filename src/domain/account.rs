//! Account model
//!
//! A registered user identity. Accounts authenticate either with a password
//! or through a linked Google identity; an account always has at least one of
//! the two. Inactive accounts fail every authentication path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Maximum display name length
pub const MAX_NAME_LEN: usize = 50;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// How the account was created / how it signs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginKind {
    Password,
    Google,
}

impl LoginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginKind::Password => "password",
            LoginKind::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "password" => Ok(LoginKind::Password),
            "google" => Ok(LoginKind::Google),
            other => Err(AppError::Internal(format!("unknown login kind: {other}"))),
        }
    }
}

/// Persisted account record
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Absent for Google-only accounts
    pub password_hash: Option<String>,
    /// Google "sub" claim; at most one account per subject
    pub google_id: Option<String>,
    pub picture: String,
    pub login_kind: LoginKind,
    pub is_active: bool,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether this account can authenticate with a password at all
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Public view of the account, safe to return to the client
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            picture: self.picture.clone(),
            login_kind: self.login_kind,
            created_at: self.created_at,
        }
    }
}

/// Account fields exposed through the API
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub login_kind: LoginKind,
    pub created_at: DateTime<Utc>,
}

/// Profile update with explicit field presence.
///
/// `picture` distinguishes "not supplied" (keep the stored value) from an
/// explicit `null` (clear it).
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Patch<String>,
}

/// Tri-state patch value for optional fields in partial updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    /// Field absent from the request: keep the stored value
    #[default]
    Keep,
    /// Field explicitly null: clear the stored value
    Clear,
    /// Field supplied: replace the stored value
    Set(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

/// Trim and lowercase an email for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a (already normalized) email address
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::Validation("Email is required!".to_string()));
    }
    let well_formed = email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(char::is_whitespace);
    if !well_formed {
        return Err(AppError::Validation("Invalid email address!".to_string()));
    }
    Ok(())
}

/// Validate and trim a display name
pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required!".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters!"
        )));
    }
    Ok(name.to_string())
}

/// Clamp an externally supplied display name to the maximum length.
///
/// Counts characters, not bytes, so multibyte names never split inside a
/// code point.
pub fn clamp_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

/// Validate a candidate password
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters!"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.COM "), "alice@x.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@x.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert!(validate_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_clamp_name() {
        assert_eq!(clamp_name("Alice"), "Alice");
        assert_eq!(clamp_name(&"x".repeat(60)), "x".repeat(50));
        // 51 chars of 3 bytes each: byte 50 is mid-character
        assert_eq!(clamp_name(&"€".repeat(51)), "€".repeat(50));
        assert_eq!(clamp_name(&"€".repeat(17)), "€".repeat(17));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn test_patch_deserialization() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            picture: Patch<String>,
        }

        let absent: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.picture, Patch::Keep);

        let cleared: Body = serde_json::from_str(r#"{"picture": null}"#).unwrap();
        assert_eq!(cleared.picture, Patch::Clear);

        let set: Body = serde_json::from_str(r#"{"picture": "https://img"}"#).unwrap();
        assert_eq!(set.picture, Patch::Set("https://img".to_string()));
    }

    #[test]
    fn test_login_kind_round_trip() {
        assert_eq!(LoginKind::parse("password").unwrap(), LoginKind::Password);
        assert_eq!(LoginKind::parse("google").unwrap(), LoginKind::Google);
        assert!(LoginKind::parse("github").is_err());
        assert_eq!(LoginKind::Google.as_str(), "google");
    }
}
