//! Transaction store
//!
//! Income and expense records, scoped per owner. The two kinds live in
//! separate tables with identical shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{NewTransaction, Transaction, TransactionKind};
use crate::error::{AppError, AppResult};

type TransactionRow = (
    Uuid,
    Uuid,
    String,
    Decimal,
    String,
    String,
    NaiveDate,
    DateTime<Utc>,
);

fn transaction_from_row(row: TransactionRow) -> Transaction {
    let (id, user_id, title, amount, category, description, date, created_at) = row;
    Transaction {
        id,
        user_id,
        title,
        amount,
        category,
        description,
        date,
        created_at,
    }
}

/// sqlx-backed store for incomes and expenses
#[derive(Clone)]
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a validated transaction for its owner
    pub async fn insert(
        &self,
        owner_id: Uuid,
        kind: TransactionKind,
        new: &NewTransaction,
    ) -> AppResult<Transaction> {
        let row: TransactionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO {} (user_id, title, amount, category, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, amount, category, description, date, created_at
            "#,
            kind.table()
        ))
        .bind(owner_id)
        .bind(new.title.trim())
        .bind(new.amount)
        .bind(new.category.trim())
        .bind(new.description.trim())
        .bind(new.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction_from_row(row))
    }

    /// All transactions of one kind for an owner, newest first
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        kind: TransactionKind,
    ) -> AppResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT id, user_id, title, amount, category, description, date, created_at
            FROM {}
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
            kind.table()
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(transaction_from_row).collect())
    }

    /// Delete by id and owner together, so a miss never reveals whether the
    /// id exists under another account.
    pub async fn delete(
        &self,
        owner_id: Uuid,
        kind: TransactionKind,
        id: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
            kind.table()
        ))
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} not found or unauthorized",
                kind.label()
            )));
        }
        Ok(())
    }
}
