//! Incoming-webhook sender: one JSON POST per message, success is HTTP 200.

use crate::config::WebhookConfig;
use serde::Serialize;

/// Attachment block of a webhook message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Attachment {
    pub title: String,
    pub title_link: String,
    pub text: String,
}

/// Webhook payload: `{ user_name, icon_emoji, text, attachments }`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookMessage {
    #[serde(rename = "user_name")]
    pub username: String,
    pub icon_emoji: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl WebhookMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned invalid status code {0}")]
    Status(u16),
    #[error("webhook url not configured")]
    NotConfigured,
}

/// Posts messages to one webhook URL.
#[derive(Clone)]
pub struct WebhookClient {
    url: String,
    username: Option<String>,
    icon_emoji: Option<String>,
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            icon_emoji: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build from config; the username and emoji fill in messages that leave them empty.
    pub fn from_config(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(WebhookError::NotConfigured)?;
        let mut client = Self::new(url);
        client.username = config.username.clone();
        client.icon_emoji = config.icon_emoji.clone();
        Ok(client)
    }

    /// POST the message as JSON. Anything but 200 is an error.
    pub async fn send(&self, message: &WebhookMessage) -> Result<(), WebhookError> {
        let mut message = message.clone();
        if message.username.is_empty() {
            message.username = self.username.clone().unwrap_or_default();
        }
        if message.icon_emoji.is_empty() {
            message.icon_emoji = self.icon_emoji.clone().unwrap_or_default();
        }
        log::debug!("webhook: sending message ({} bytes of text)", message.text.len());
        let res = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| WebhookError::Request(e.without_url()))?;
        let status = res.status();
        log::debug!("webhook: got status code {}", status.as_u16());
        if status != reqwest::StatusCode::OK {
            return Err(WebhookError::Status(status.as_u16()));
        }
        Ok(())
    }

    /// Shorthand for a plain-text message.
    pub async fn send_text(&self, text: &str) -> Result<(), WebhookError> {
        self.send(&WebhookMessage::text(text)).await
    }
}
