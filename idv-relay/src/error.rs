//! Error types for idv-relay
//!
//! Every error leaves the server as `{ "error": "<message>" }`. Internal
//! detail is logged, never serialised.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use idv_common::api::{ErrorBody, MissingParts};
use thiserror::Error;
use tracing::error;

use crate::services::RelayFailure;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// One or more of the three parts absent (400)
    #[error(transparent)]
    MissingParts(#[from] MissingParts),

    /// A single part exceeds the per-file limit (413)
    #[error("Part {part} exceeds {limit} bytes")]
    PayloadTooLarge { part: String, limit: usize },

    /// Whole body exceeds the request limit (413)
    #[error("Request body exceeds limit")]
    RequestTooLarge,

    /// Credentials were deferred and never supplied (500)
    #[error("Telegram credentials not configured")]
    NotConfigured,

    /// Upstream delivery failed part-way (500)
    #[error(transparent)]
    Relay(#[from] RelayFailure),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingParts(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } | ApiError::RequestTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::NotConfigured | ApiError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the uploader
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(_) => "Solicitud inválida.".to_string(),
            ApiError::MissingParts(missing) => format!(
                "Faltan archivos (se esperan 3): {}",
                missing
                    .missing
                    .iter()
                    .map(|role| role.part_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ApiError::PayloadTooLarge { part, limit } => format!(
                "El archivo {} supera el límite de {} MB.",
                part,
                limit / (1024 * 1024)
            ),
            ApiError::RequestTooLarge => {
                "La solicitud supera el tamaño máximo permitido.".to_string()
            }
            ApiError::NotConfigured => "Error de configuración interna del servidor.".to_string(),
            ApiError::Relay(failure) => match failure.source.public_detail() {
                Some(detail) => format!(
                    "Error al enviar {} a Telegram: {}",
                    failure.role.part_name(),
                    detail
                ),
                None => format!("Error al enviar {} a Telegram.", failure.role.part_name()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
