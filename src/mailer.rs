//! Outbound email port and its transports.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Mail API rejected message: {0}")]
    Rejected(String),
    #[error("No recipient address")]
    NoRecipient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Posts `{from, to, subject, text}` to a transactional mail API.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[derive(Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if email.to.trim().is_empty() {
            return Err(MailError::NoRecipient);
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&MailRequest {
                from: &self.config.from,
                to: &email.to,
                subject: &email.subject,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{}: {}", status, body)));
        }

        tracing::debug!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, text = %email.text, "email (log transport)");
        Ok(())
    }
}

/// HTTP transport when mail settings are present, log transport otherwise.
pub fn from_config(config: Option<&MailConfig>) -> Arc<dyn Mailer> {
    match config {
        Some(config) => Arc::new(HttpMailer::new(config.clone())),
        None => {
            tracing::warn!("MAIL_API_URL not configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: String) -> MailConfig {
        MailConfig {
            api_url: format!("{}/send", url),
            api_key: "mk_test".to_string(),
            from: "Eventark <noreply@eventark.com>".to_string(),
        }
    }

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "owner@example.com".to_string(),
            subject: "Birthday - New Tip".to_string(),
            text: "Grace has just tipped you ₦500.00 for Birthday".to_string(),
        }
    }

    #[tokio::test]
    async fn test_http_mailer_posts_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .match_header("authorization", "Bearer mk_test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "to": "owner@example.com",
                "subject": "Birthday - New Tip",
            })))
            .with_status(202)
            .create_async()
            .await;

        let mailer = HttpMailer::new(config(server.url()));
        mailer.send(&email()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_mailer_surfaces_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/send")
            .with_status(422)
            .with_body("bad sender")
            .create_async()
            .await;

        let mailer = HttpMailer::new(config(server.url()));
        let result = mailer.send(&email()).await;

        assert!(matches!(result, Err(MailError::Rejected(message)) if message.contains("bad sender")));
    }

    #[tokio::test]
    async fn test_empty_recipient_is_not_sent() {
        let mailer = HttpMailer::new(config("http://127.0.0.1:9".to_string()));
        let mut message = email();
        message.to = String::new();

        assert!(matches!(mailer.send(&message).await, Err(MailError::NoRecipient)));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        assert!(LogMailer.send(&email()).await.is_ok());
    }
}
