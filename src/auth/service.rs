//! Auth service
//!
//! Orchestrates registration, login, Google sign-in/linking, password reset,
//! profile mutation, and account deletion over the account store, token
//! service, and mail collaborator.

use std::sync::Arc;

use crate::domain::account::{
    clamp_name, normalize_email, validate_email, validate_name, validate_password,
};
use crate::domain::{Account, AccountView, LoginKind, ProfileUpdate};
use crate::error::{AppError, AppResult};
use crate::store::AccountStore;
use crate::token::TokenService;

use super::google::GoogleTokenVerifier;
use super::mail::Mailer;
use super::password::{hash_password, verify_password};

/// Response body sent to forgot-password callers whether or not the account
/// exists, so the endpoint cannot be used to enumerate emails.
pub const FORGOT_PASSWORD_ACK: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// A successful authentication: a session token plus the account view
#[derive(Debug)]
pub struct AuthSuccess {
    pub token: String,
    pub account: AccountView,
}

/// Authentication and account lifecycle operations
pub struct AuthService {
    accounts: AccountStore,
    tokens: TokenService,
    google: Arc<dyn GoogleTokenVerifier>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        accounts: AccountStore,
        tokens: TokenService,
        google: Arc<dyn GoogleTokenVerifier>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        Self {
            accounts,
            tokens,
            google,
            mailer,
            frontend_url,
        }
    }

    fn issue_for(&self, account: &Account) -> AppResult<AuthSuccess> {
        Ok(AuthSuccess {
            token: self.tokens.issue_session(account.id)?,
            account: account.view(),
        })
    }

    /// Create a password account and sign it in
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<AuthSuccess> {
        let name = validate_name(name)?;
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User already exists with this email!".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let account = self
            .accounts
            .insert_password_account(&name, &email, &password_hash)
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");
        self.issue_for(&account)
    }

    /// Password login. Absent account, inactive account, missing credential,
    /// and hash mismatch all produce the same response.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSuccess> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required!".to_string(),
            ));
        }

        let email = normalize_email(email);
        let account = match self.accounts.find_by_email(&email).await? {
            Some(account) if account.is_active => account,
            _ => return Err(AppError::InvalidCredentials),
        };

        let matches = account
            .password_hash
            .as_deref()
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false);
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, "Login");
        self.issue_for(&account)
    }

    /// Google sign-in. Resolution order: existing subject id, then email
    /// link, then a new passwordless account. Repeat logins refresh the
    /// stored picture.
    pub async fn google_auth(&self, id_token: &str) -> AppResult<AuthSuccess> {
        let claims = self.google.verify(id_token).await?;
        let email = normalize_email(&claims.email);
        let picture = claims.picture.clone().unwrap_or_default();

        if let Some(account) = self.accounts.find_by_google_id(&claims.sub).await? {
            if !account.is_active {
                return Err(AppError::Forbidden("Account is deactivated".to_string()));
            }
            if !picture.is_empty() && picture != account.picture {
                self.accounts.refresh_picture(account.id, &picture).await?;
            }
            tracing::info!(account_id = %account.id, "Google login");
            return self.issue_for(&account);
        }

        if let Some(account) = self.accounts.find_by_email(&email).await? {
            if !account.is_active {
                return Err(AppError::Forbidden("Account is deactivated".to_string()));
            }
            self.accounts
                .link_google_identity(account.id, &claims.sub, &picture)
                .await?;
            let account = self
                .accounts
                .find_by_id(account.id)
                .await?
                .ok_or_else(|| AppError::Internal("linked account vanished".to_string()))?;
            tracing::info!(account_id = %account.id, "Google identity linked");
            return self.issue_for(&account);
        }

        let name = clamp_name(&claims.display_name());
        let account = self
            .accounts
            .insert_google_account(&name, &email, &claims.sub, &picture)
            .await?;
        tracing::info!(account_id = %account.id, "Account created via Google");
        self.issue_for(&account)
    }

    /// Start a password reset. The acknowledgment is identical whether or
    /// not the account exists; the one exception is a Google-only account,
    /// which gets an explicit rejection.
    pub async fn forgot_password(&self, email: &str) -> AppResult<&'static str> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::Validation("Email is required!".to_string()));
        }

        let account = match self.accounts.find_by_email(&email).await? {
            Some(account) if account.is_active => account,
            _ => return Ok(FORGOT_PASSWORD_ACK),
        };

        if account.login_kind == LoginKind::Google || !account.has_password() {
            return Err(AppError::Forbidden(
                "This account uses Google sign-in. Please log in with Google instead."
                    .to_string(),
            ));
        }

        let secret = self.tokens.issue_reset_secret();
        self.accounts
            .set_reset_token(account.id, &secret.hash, secret.expires)
            .await?;

        let reset_url = format!(
            "{}/reset-password?token={}",
            self.frontend_url, secret.plain
        );

        if let Err(send_err) = self
            .mailer
            .send_password_reset(&account.email, &account.name, &reset_url)
            .await
        {
            // Never leave a persisted secret the user cannot have received
            if let Err(clear_err) = self.accounts.clear_reset_token(account.id).await {
                tracing::error!(
                    account_id = %account.id,
                    "Failed to roll back reset token: {clear_err}"
                );
            }
            return Err(send_err);
        }

        tracing::info!(account_id = %account.id, "Password reset requested");
        Ok(FORGOT_PASSWORD_ACK)
    }

    /// Complete a password reset with the emailed secret. The secret is
    /// single-use: the stored hash is cleared on success.
    pub async fn reset_password(
        &self,
        plain_secret: &str,
        new_password: &str,
    ) -> AppResult<AuthSuccess> {
        validate_password(new_password)?;

        let lookup_hash = TokenService::hash_reset_secret(plain_secret);
        let account = self
            .accounts
            .find_by_reset_hash(&lookup_hash)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let new_hash = hash_password(new_password)?;
        self.accounts
            .complete_password_reset(account.id, &new_hash)
            .await?;

        let account = self
            .accounts
            .find_by_id(account.id)
            .await?
            .ok_or_else(|| AppError::Internal("reset account vanished".to_string()))?;

        tracing::info!(account_id = %account.id, "Password reset completed");
        self.issue_for(&account)
    }

    /// Current account view for an authenticated session
    pub async fn me(&self, account_id: uuid::Uuid) -> AppResult<AccountView> {
        match self.accounts.find_by_id(account_id).await? {
            Some(account) if account.is_active => Ok(account.view()),
            _ => Err(AppError::Unauthenticated),
        }
    }

    /// Update name/email/picture; email conflicts with other accounts fail
    pub async fn update_profile(
        &self,
        account_id: uuid::Uuid,
        update: ProfileUpdate,
    ) -> AppResult<AccountView> {
        let name = validate_name(&update.name)?;
        let email = normalize_email(&update.email);
        validate_email(&email)?;

        if self.accounts.email_taken_by_other(&email, account_id).await? {
            return Err(AppError::Conflict("Email is already taken!".to_string()));
        }

        self.accounts
            .update_profile(account_id, &name, &email, &update.picture)
            .await?;

        self.me(account_id).await
    }

    /// Change the password after confirming the current one
    pub async fn change_password(
        &self,
        account_id: uuid::Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let stored_hash = account.password_hash.as_deref().ok_or_else(|| {
            AppError::Forbidden(
                "Password change is not available for Google sign-in accounts".to_string(),
            )
        })?;

        if !verify_password(current_password, stored_hash) {
            return Err(AppError::InvalidCredentials);
        }

        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.accounts.set_password_hash(account.id, &new_hash).await?;

        tracing::info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    /// Delete the account and all of its transactions. Password-kind
    /// accounts must confirm with their password.
    pub async fn delete_account(
        &self,
        account_id: uuid::Uuid,
        password: Option<&str>,
    ) -> AppResult<()> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if let Some(stored_hash) = account.password_hash.as_deref() {
            let supplied = password.ok_or(AppError::InvalidCredentials)?;
            if !verify_password(supplied, stored_hash) {
                return Err(AppError::InvalidCredentials);
            }
        }

        self.accounts.delete_with_owned_records(account.id).await?;

        tracing::info!(account_id = %account.id, "Account deleted");
        Ok(())
    }
}
