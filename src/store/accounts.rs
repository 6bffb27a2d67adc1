//! Account store
//!
//! Persisted user records. Email uniqueness is case-insensitive (unique
//! index on LOWER(email)); the Google subject id is sparse-unique.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, LoginKind, Patch};
use crate::error::{AppError, AppResult};

/// Column list shared by every account SELECT
const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, google_id, picture, login_kind, \
     is_active, reset_token_hash, reset_token_expires, created_at, updated_at";

type AccountRow = (
    Uuid,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    bool,
    Option<String>,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn account_from_row(row: AccountRow) -> AppResult<Account> {
    let (
        id,
        name,
        email,
        password_hash,
        google_id,
        picture,
        login_kind,
        is_active,
        reset_token_hash,
        reset_token_expires,
        created_at,
        updated_at,
    ) = row;
    Ok(Account {
        id,
        name,
        email,
        password_hash,
        google_id,
        picture,
        login_kind: LoginKind::parse(&login_kind)?,
        is_active,
        reset_token_hash,
        reset_token_expires,
        created_at,
        updated_at,
    })
}

/// Map a unique-index violation to a Conflict, everything else to Database
fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

/// sqlx-backed credential store
#[derive(Clone)]
pub struct AccountStore {
    pool: PgPool,
}

impl AccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    /// Lookup by normalized (lowercased) email
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE LOWER(email) = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    /// Whether the email is already used by an account other than `id`
    pub async fn email_taken_by_other(&self, email: &str, id: Uuid) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Create a password-kind account
    pub async fn insert_password_account(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Account> {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, login_kind)
            VALUES ($1, $2, $3, 'password')
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists with this email!"))?;

        account_from_row(row)
    }

    /// Create a Google-kind account with no password
    pub async fn insert_google_account(
        &self,
        name: &str,
        email: &str,
        google_id: &str,
        picture: &str,
    ) -> AppResult<Account> {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (name, email, google_id, picture, login_kind)
            VALUES ($1, $2, $3, $4, 'google')
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(google_id)
        .bind(picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists with this email!"))?;

        account_from_row(row)
    }

    /// Link a Google identity onto an existing account
    pub async fn link_google_identity(
        &self,
        id: Uuid,
        google_id: &str,
        picture: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET google_id = $2, picture = $3, login_kind = 'google', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(google_id)
        .bind(picture)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Google account already linked to another user!"))?;
        Ok(())
    }

    /// Refresh the avatar on a repeat Google login
    pub async fn refresh_picture(&self, id: Uuid, picture: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET picture = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(picture)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Apply a profile update; `picture` carries explicit presence
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        picture: &Patch<String>,
    ) -> AppResult<()> {
        let result = match picture {
            Patch::Keep => {
                sqlx::query(
                    "UPDATE users SET name = $2, email = $3, updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .execute(&self.pool)
                .await
            }
            Patch::Clear => {
                sqlx::query(
                    "UPDATE users SET name = $2, email = $3, picture = '', updated_at = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .execute(&self.pool)
                .await
            }
            Patch::Set(picture) => {
                sqlx::query(
                    "UPDATE users SET name = $2, email = $3, picture = $4, updated_at = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .bind(picture)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| conflict_on_unique(e, "Email is already taken!"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist a pending reset secret (hash + expiry)
    pub async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires = $3, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Roll back a pending reset (e.g. after a failed email send)
    pub async fn clear_reset_token(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = NULL, reset_token_expires = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find the active account holding an unexpired reset secret
    pub async fn find_by_reset_hash(&self, token_hash: &str) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM users
            WHERE reset_token_hash = $1
              AND reset_token_expires > NOW()
              AND is_active = TRUE
            "#
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    /// Consume a reset secret: store the new hash and clear both reset fields
    pub async fn complete_password_reset(
        &self,
        id: Uuid,
        new_password_hash: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token_hash = NULL, reset_token_expires = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(new_password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Hard-delete an account and everything it owns.
    ///
    /// Transactions are removed before the account row, inside one database
    /// transaction, so a partial failure rolls everything back.
    pub async fn delete_with_owned_records(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM incomes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM expenses WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
