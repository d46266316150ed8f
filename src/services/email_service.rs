use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::config::MailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SendGrid API key is not configured")]
    NotConfigured,

    #[error("SendGrid request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Sends transactional mail through the SendGrid v3 API
#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    api_key: Option<String>,
    sender: String,
}

impl EmailService {
    pub fn new(config: &MailConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key: config.sendgrid_api_key.clone(),
            sender: config.sender_email_address.clone(),
        }
    }

    /// Returns whether SendGrid accepted the message (202).
    pub async fn send_email(&self, to_email_address: &str, subject: &str, html: &str) -> Result<bool, MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&Self::message(&self.sender, to_email_address, subject, html))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            error!("SendGrid rejected mail to {} with {}: {}", to_email_address, status, body);
            return Ok(false);
        }

        Ok(true)
    }

    /// Like `send_email`, but failures are logged and reported as `false`.
    pub async fn try_send_email(&self, to_email_address: &str, subject: &str, html: &str) -> bool {
        match self.send_email(to_email_address, subject, html).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!("Unable to send mail to {}: {}", to_email_address, e);
                false
            }
        }
    }

    fn message(from: &str, to: &str, subject: &str, html: &str) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sendgrid_message() {
        let message = EmailService::message(
            "no-reply@pooper.online",
            "admin@pooper.online",
            "Reset your password",
            "<a href=\"x\">x</a>",
        );
        assert_eq!(message["personalizations"][0]["to"][0]["email"], "admin@pooper.online");
        assert_eq!(message["from"]["email"], "no-reply@pooper.online");
        assert_eq!(message["content"][0]["type"], "text/html");
    }

    #[tokio::test]
    async fn unconfigured_service_does_not_send() {
        let service = EmailService::new(&MailConfig::default(), reqwest::Client::new());
        assert!(matches!(
            service.send_email("a@b.c", "s", "m").await,
            Err(MailError::NotConfigured)
        ));
        assert!(!service.try_send_email("a@b.c", "s", "m").await);
    }
}
