//! Transactional email via the SendGrid v3 REST API

use async_trait::async_trait;
use serde_json::json;

use crate::error::IntegrationError;

pub const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Returns the provider's message id when it reports one
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, IntegrationError>;
}

/// Unconfigured mode: logs the message and reports it sent
#[derive(Debug, Default)]
pub struct MockMailer;

#[async_trait]
impl Mailer for MockMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, IntegrationError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email not configured, notification logged only"
        );
        Ok(None)
    }
}

pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    base_url: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self::with_base_url(api_key, from_email, SENDGRID_API_BASE)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from_email: from_email.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, IntegrationError> {
        let resp = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "personalizations": [{"to": [{"email": message.to}]}],
                "from": {"email": self.from_email, "name": "The Printed Bay"},
                "subject": message.subject,
                "content": [
                    {"type": "text/plain", "value": message.text},
                    {"type": "text/html", "value": message.html},
                ],
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::vendor(
                "sendgrid",
                format!("status {status}: {body}"),
            ));
        }

        let message_id = resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        tracing::info!(to = %message.to, message_id = ?message_id, "Email sent");
        Ok(message_id)
    }
}
