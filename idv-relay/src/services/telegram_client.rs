//! Telegram Bot API client
//!
//! Sends one captioned photo or video per call via `sendPhoto` / `sendVideo`.
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they are logged or returned.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::{AttachmentSink, DeliveryError, OutboundAttachment};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const USER_AGENT: &str = concat!("idv-relay/", env!("CARGO_PKG_VERSION"));

/// Bot token plus destination chat
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    bot_token: String,
    chat_id: String,
}

impl TelegramCredentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Error envelope returned by the Bot API
#[derive(Debug, Deserialize)]
struct TelegramErrorBody {
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base: String,
    credentials: TelegramCredentials,
}

impl TelegramClient {
    pub fn new(
        credentials: TelegramCredentials,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Client(e.without_url().to_string()))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.credentials.bot_token, method)
    }
}

#[async_trait]
impl AttachmentSink for TelegramClient {
    async fn deliver(&self, attachment: OutboundAttachment<'_>) -> Result<(), DeliveryError> {
        let file = attachment.file;
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| DeliveryError::Client(e.without_url().to_string()))?;

        let form = Form::new()
            .text("chat_id", self.credentials.chat_id.clone())
            .text("caption", attachment.caption)
            .part(attachment.kind.field_name(), part);

        tracing::debug!(
            method = attachment.kind.method(),
            file_name = %file.file_name,
            bytes = file.len(),
            "Calling Telegram Bot API"
        );

        let response = self
            .http_client
            .post(self.method_url(attachment.kind.method()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await.unwrap_or_default();
        let description = serde_json::from_slice::<TelegramErrorBody>(&body)
            .ok()
            .and_then(|b| b.description);

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description,
        })
    }
}
