//! idv-relay library - Relay Endpoint
//!
//! Accepts one three-part multipart upload and forwards each part to the
//! Telegram Bot API as a captioned attachment.

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::config::RelaySettings;
use crate::services::{AttachmentSink, DeliveryError, TelegramClient};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Delivery sink; None when credentials were deferred and are missing
    pub sink: Option<Arc<dyn AttachmentSink>>,
    /// Per-file upload limit in bytes
    pub max_file_bytes: usize,
    /// Directory served for every non-API GET
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        sink: Option<Arc<dyn AttachmentSink>>,
        max_file_bytes: usize,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sink,
            max_file_bytes,
            static_dir: static_dir.into(),
        }
    }

    /// Build state with a Telegram client when credentials are present
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, DeliveryError> {
        let sink = match &settings.credentials {
            Some(credentials) => {
                let client = TelegramClient::new(
                    credentials.clone(),
                    &settings.telegram_api_base,
                    settings.upstream_timeout,
                )?;
                Some(Arc::new(client) as Arc<dyn AttachmentSink>)
            }
            None => None,
        };

        Ok(Self::new(sink, settings.max_file_bytes, settings.static_dir.clone()))
    }

    pub fn credentials_configured(&self) -> bool {
        self.sink.is_some()
    }

    /// Whole-request body limit: three files plus multipart framing
    pub fn body_limit_bytes(&self) -> usize {
        self.max_file_bytes.saturating_mul(3).saturating_add(1024 * 1024)
    }
}

/// Build application router
///
/// - `POST /api/enviar-a-telegram` upload relay
/// - `GET /health` health check
/// - everything else served from the static directory (`/` → `index.html`)
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .merge(api::upload_routes(state.body_limit_bytes()))
        .merge(api::health_routes())
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
