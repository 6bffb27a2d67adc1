//! Transaction model
//!
//! Incomes and expenses are structurally identical records kept in separate
//! tables. Every transaction is owned by exactly one account and is only
//! visible to its owner.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Maximum title length
pub const MAX_TITLE_LEN: usize = 50;

/// Maximum description length
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// The two transaction collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Table backing this kind. Only ever one of two fixed identifiers, so it
    /// is safe to splice into SQL text.
    pub fn table(&self) -> &'static str {
        match self {
            TransactionKind::Income => "incomes",
            TransactionKind::Expense => "expenses",
        }
    }

    /// Capitalized label used in response messages ("Income Added")
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

/// Persisted income or expense record
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    /// User-supplied transaction date, distinct from record creation time
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
}

impl NewTransaction {
    /// Check all field-level rules before the record hits the store
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty()
            || self.category.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(AppError::Validation("All fields are required!".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title must be at most {MAX_TITLE_LEN} characters!"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "Description must be at most {MAX_DESCRIPTION_LEN} characters!"
            )));
        }
        if self.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Amount must be a positive number!".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lunch(amount: Decimal) -> NewTransaction {
        NewTransaction {
            title: "Lunch".to_string(),
            amount,
            category: "food".to_string(),
            description: "deli".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_positive_amount_is_valid() {
        assert!(lunch(dec!(12.50)).validate().is_ok());
        assert!(lunch(dec!(15)).validate().is_ok());
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        assert!(lunch(dec!(0)).validate().is_err());
        assert!(lunch(dec!(-5)).validate().is_err());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut tx = lunch(dec!(10));
        tx.title = "   ".to_string();
        assert!(tx.validate().is_err());

        let mut tx = lunch(dec!(10));
        tx.category = String::new();
        assert!(tx.validate().is_err());

        let mut tx = lunch(dec!(10));
        tx.description = String::new();
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_length_limits() {
        let mut tx = lunch(dec!(10));
        tx.title = "x".repeat(51);
        assert!(tx.validate().is_err());

        let mut tx = lunch(dec!(10));
        tx.description = "x".repeat(201);
        assert!(tx.validate().is_err());

        let mut tx = lunch(dec!(10));
        tx.description = "x".repeat(200);
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(TransactionKind::Income.table(), "incomes");
        assert_eq!(TransactionKind::Expense.table(), "expenses");
        assert_eq!(TransactionKind::Expense.label(), "Expense");
    }

    #[test]
    fn test_new_transaction_deserialize_number_amount() {
        let json = r#"{
            "title": "Lunch",
            "amount": 15,
            "category": "food",
            "description": "deli",
            "date": "2024-01-01"
        }"#;
        let tx: NewTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, dec!(15));
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
