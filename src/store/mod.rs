//! Persistence layer
//!
//! sqlx-backed stores for accounts and transactions. The database is the
//! only shared mutable resource; uniqueness (email, Google subject) is
//! enforced by indexes, and multi-row deletes run in a transaction.

pub mod accounts;
pub mod transactions;

pub use accounts::AccountStore;
pub use transactions::TransactionStore;
