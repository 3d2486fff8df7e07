//! Shared helpers for idv-relay integration tests
//!
//! - `RecordingSink`: fake delivery sink that records every call and can be
//!   told to fail on the Nth delivery
//! - `MultipartBody`: hand-built multipart/form-data request bodies
//! - response helpers for JSON bodies

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use idv_relay::services::{AttachmentKind, AttachmentSink, DeliveryError, OutboundAttachment};
use idv_relay::AppState;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const BOUNDARY: &str = "----idv-test-boundary-7MA4YWxkTrZu0gW";

/// One recorded delivery
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub kind: AttachmentKind,
    pub caption: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fake sink recording every delivery attempt
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<DeliveryRecord>>,
    /// 0-based index of the delivery attempt that should fail
    fail_at: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_at(index: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_at: Some(index),
        })
    }

    /// All attempts, including the failed one
    pub fn calls(&self) -> Vec<DeliveryRecord> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentSink for RecordingSink {
    async fn deliver(&self, attachment: OutboundAttachment<'_>) -> Result<(), DeliveryError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(DeliveryRecord {
            kind: attachment.kind,
            caption: attachment.caption,
            file_name: attachment.file.file_name.clone(),
            content_type: attachment.file.content_type.clone(),
            bytes: attachment.file.bytes.clone(),
        });

        if self.fail_at == Some(index) {
            return Err(DeliveryError::Rejected {
                status: 400,
                description: Some("Bad Request: wrong file identifier".to_string()),
            });
        }
        Ok(())
    }
}

/// App state around a fake sink with a 1 MiB per-file limit
pub fn test_state(sink: Arc<RecordingSink>) -> AppState {
    AppState::new(Some(sink as Arc<dyn AttachmentSink>), 1024 * 1024, "public")
}

/// Builder for multipart/form-data bodies
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// The three parts a capture client sends
    pub fn complete() -> Self {
        Self::new()
            .file("idFront", "id_front.jpg", "image/jpeg", b"\xFF\xD8front-jpeg\xFF\xD9")
            .file("idBack", "id_back.jpg", "image/jpeg", b"\xFF\xD8back-jpeg\xFF\xD9")
            .file("video", "selfie.webm", "video/webm", b"\x1A\x45\xDF\xA3webm-clip")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }

    pub fn into_request(self, uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.finish()))
            .unwrap()
    }
}

/// Collect a response body as JSON
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text
pub async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
