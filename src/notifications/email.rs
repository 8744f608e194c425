//! Transaction email service.
//!
//! Sends the "new transaction" email for each webhook payload, using the SMTP
//! settings from the main config file.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

pub const TRANSACTION_SUBJECT: &str = "New Transaction!!";

/// Service for sending transaction emails
#[derive(Clone)]
pub struct TransactionMailer {
    config: EmailConfig,
}

impl TransactionMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Check if email sending is configured and enabled
    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Email the raw transaction payload to the configured recipient.
    pub async fn send_transaction_email(&self, payload: &str) -> Result<()> {
        if !self.is_enabled() {
            tracing::warn!("Email not configured, skipping transaction email");
            return Ok(());
        }

        let recipient = self
            .config
            .recipient
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Recipient not configured"))?;

        self.send_email(
            recipient,
            TRANSACTION_SUBJECT,
            &render_transaction_html(payload),
            &render_transaction_text(payload),
        )
        .await
    }

    /// Send an email with HTML and plain text versions
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from: Mailbox = from_address.parse()?;
        let to: Mailbox = to_email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let mailer = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        tracing::info!(
            to = %to_email,
            subject = %subject,
            "Email sent successfully"
        );

        Ok(())
    }
}

fn render_transaction_html(payload: &str) -> String {
    format!(
        "<div><h2>New transaction!!</h2><p>{}</p></div>",
        html_escape(payload)
    )
}

fn render_transaction_text(payload: &str) -> String {
    format!("New transaction!!\n\n{}", payload)
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
