//! Expense Tracker Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod auth;
pub mod domain;
pub mod store;
pub mod token;

pub mod config;
pub mod db;
mod error;

pub use api::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use token::TokenService;
