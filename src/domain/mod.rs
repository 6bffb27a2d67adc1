//! Domain module
//!
//! Core domain types and business logic.

pub mod account;
pub mod transaction;

pub use account::{Account, AccountView, LoginKind, Patch, ProfileUpdate};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
