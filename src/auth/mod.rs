//! Authentication module
//!
//! Registration, login, Google sign-in, password reset, and account
//! lifecycle, orchestrated over the account store and token service.

pub mod google;
pub mod mail;
pub mod password;
pub mod service;

pub use google::{GoogleClaims, GoogleTokenVerifier, GoogleVerifier};
pub use mail::{DisabledMailer, Mailer, SmtpMailer};
pub use service::{AuthService, AuthSuccess};
