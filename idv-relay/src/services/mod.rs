//! Outbound delivery services
//!
//! The relay forwards each artifact through an [`AttachmentSink`]. The
//! production sink is [`telegram_client::TelegramClient`]; tests substitute a
//! recording fake.

pub mod relay;
pub mod telegram_client;

pub use relay::{caption_for, forward_bundle, RelayFailure};
pub use telegram_client::{TelegramClient, TelegramCredentials};

use async_trait::async_trait;
use idv_common::api::Artifact;
use thiserror::Error;

/// How the remote API should present an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
}

impl AttachmentKind {
    /// Bot API method name
    pub fn method(self) -> &'static str {
        match self {
            AttachmentKind::Photo => "sendPhoto",
            AttachmentKind::Video => "sendVideo",
        }
    }

    /// Multipart field carrying the file
    pub fn field_name(self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Video => "video",
        }
    }
}

/// One attachment-delivery call
#[derive(Debug)]
pub struct OutboundAttachment<'a> {
    pub kind: AttachmentKind,
    pub caption: String,
    pub file: &'a Artifact,
}

/// Delivery failures
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Request never produced a response (connect, TLS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote API answered with a non-success status
    #[error("Upstream rejected delivery ({status}): {}", .description.as_deref().unwrap_or("no description"))]
    Rejected {
        status: u16,
        description: Option<String>,
    },

    /// Client could not be constructed or request could not be built
    #[error("Client error: {0}")]
    Client(String),
}

impl DeliveryError {
    /// Detail safe to show to the uploader
    pub fn public_detail(&self) -> Option<&str> {
        match self {
            DeliveryError::Rejected { description, .. } => description.as_deref(),
            DeliveryError::Network(_) | DeliveryError::Client(_) => None,
        }
    }
}

/// Remote sink accepting one captioned attachment per call
#[async_trait]
pub trait AttachmentSink: Send + Sync {
    async fn deliver(&self, attachment: OutboundAttachment<'_>) -> Result<(), DeliveryError>;
}
