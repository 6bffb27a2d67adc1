//! Outgoing mail
//!
//! The auth service only ever sends one kind of message: the password-reset
//! link. The `Mailer` trait is the seam; production uses SMTP via lettre,
//! deployments without SMTP configuration get `DisabledMailer` so that
//! forgot-password surfaces a send failure instead of silently dropping
//! the secret.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};

/// Sends password-reset messages
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> AppResult<()>;
}

/// SMTP mailer backed by lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(smtp: &SmtpConfig, mail_from: &str) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| AppError::Internal(format!("SMTP relay setup failed: {e}")))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();

        let from = mail_from
            .parse()
            .map_err(|e| AppError::Internal(format!("invalid MAIL_FROM address: {e}")))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> AppResult<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Reset Your Password - Expense Tracker")
            .header(ContentType::TEXT_HTML)
            .body(reset_email_body(name, reset_url))
            .map_err(|e| AppError::Mail(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        tracing::info!("Password reset email sent");
        Ok(())
    }
}

/// Mailer used when SMTP is not configured; every send fails
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_password_reset(&self, _to: &str, _name: &str, _reset_url: &str) -> AppResult<()> {
        Err(AppError::Mail("SMTP is not configured".to_string()))
    }
}

/// HTML body for the reset message
fn reset_email_body(name: &str, reset_url: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
    <h2>Hello {name}!</h2>
    <p>We received a request to reset your password for your Expense Tracker account.</p>
    <p><a href="{reset_url}">Reset My Password</a></p>
    <p><strong>This link will expire in 1 hour.</strong></p>
    <p>If you didn't request this password reset, please ignore this email. Your account is safe.</p>
    <p style="font-size: 12px; color: #666;">
        If the link doesn't work, copy and paste this URL into your browser:<br>
        {reset_url}
    </p>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_body_contains_link_and_name() {
        let body = reset_email_body("Alice", "http://localhost:3000/reset-password?token=abc");
        assert!(body.contains("Hello Alice!"));
        assert!(body.contains("http://localhost:3000/reset-password?token=abc"));
        assert!(body.contains("expire in 1 hour"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_always_fails() {
        let result = DisabledMailer
            .send_password_reset("a@x.com", "A", "http://x")
            .await;
        assert!(matches!(result, Err(AppError::Mail(_))));
    }
}
