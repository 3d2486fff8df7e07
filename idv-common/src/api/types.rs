//! JSON bodies returned by the relay upload endpoint

use serde::{Deserialize, Serialize};

/// Success acknowledgement (`200`)
///
/// # Examples
///
/// ```
/// use idv_common::api::UploadAck;
///
/// let ack = UploadAck::sent();
/// assert!(ack.success);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAck {
    pub success: bool,
    pub message: String,
}

impl UploadAck {
    /// Acknowledgement for a fully relayed bundle
    pub fn sent() -> Self {
        Self {
            success: true,
            message: "Archivos enviados.".to_string(),
        }
    }
}

/// Error body (`400`, `413`, `500`)
///
/// Only a human-readable message; no internal detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Extract the `error` message from a response body, if it is one
    ///
    /// Returns None for non-JSON bodies, JSON without an `error` string,
    /// and blank messages.
    pub fn parse_message(body: &[u8]) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        let message = parsed.error.trim();
        if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        }
    }
}
