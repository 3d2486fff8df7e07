//! Upload of a completed bundle
//!
//! The controller hands the bundle to an [`UploadTransport`]; the production
//! transport is [`HttpUploadTransport`], a reqwest multipart POST to the relay.

use async_trait::async_trait;
use idv_common::api::{ErrorBody, MissingParts, UploadBundle};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("idv-capture/", env!("CARGO_PKG_VERSION"));
const GENERIC_UPLOAD_MESSAGE: &str =
    "No pudimos verificar tus archivos. Por favor, inténtalo de nuevo.";

/// Raw relay reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UploadReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` message of a JSON error body
    pub fn error_message(&self) -> Option<String> {
        ErrorBody::parse_message(&self.body)
    }
}

/// Upload failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Artifacts missing; nothing was sent
    #[error("Upload bundle incomplete: {0}")]
    Incomplete(#[from] MissingParts),

    /// Request never produced a response
    #[error("Upload transport failed: {0}")]
    Transport(String),

    #[error("Upload timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// Relay answered with a non-2xx status
    #[error("Upload rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl UploadError {
    /// Message to show the user
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_UPLOAD_MESSAGE.to_string(),
        }
    }
}

/// Sends one bundle as a single multipart request
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Submit the bundle; any HTTP reply is `Ok`, whatever its status
    async fn send(&self, bundle: UploadBundle) -> Result<UploadReply, UploadError>;
}

/// Upload `bundle`, bounded by `timeout`
///
/// Non-2xx replies and transport failures are errors; there is no retry.
pub async fn upload<U: UploadTransport>(
    transport: &U,
    bundle: UploadBundle,
    timeout: Duration,
) -> Result<(), UploadError> {
    let total = bundle.total_len();
    info!(bytes = total, "Uploading capture bundle");

    let reply = match tokio::time::timeout(timeout, transport.send(bundle)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Upload timed out");
            return Err(UploadError::TimedOut(timeout));
        }
    };

    if reply.is_success() {
        info!(status = reply.status, "Upload accepted");
        return Ok(());
    }

    let message = reply.error_message();
    warn!(status = reply.status, message = ?message, "Upload rejected");
    Err(UploadError::Rejected {
        status: reply.status,
        message,
    })
}

/// reqwest-based multipart transport
pub struct HttpUploadTransport {
    http_client: reqwest::Client,
    upload_url: String,
}

impl HttpUploadTransport {
    pub fn new(upload_url: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            upload_url: upload_url.into(),
        })
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn send(&self, bundle: UploadBundle) -> Result<UploadReply, UploadError> {
        let mut form = Form::new();
        for (role, artifact) in bundle.into_parts() {
            debug!(
                part = %role,
                file_name = %artifact.file_name,
                bytes = artifact.len(),
                "Adding part"
            );
            let part = Part::bytes(artifact.bytes)
                .file_name(artifact.file_name)
                .mime_str(&artifact.content_type)
                .map_err(|e| UploadError::Transport(e.to_string()))?;
            form = form.part(role.part_name(), part);
        }

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(UploadReply {
            status,
            body: body.to_vec(),
        })
    }
}
