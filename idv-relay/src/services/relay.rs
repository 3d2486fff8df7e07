//! Sequential best-effort forwarding of an upload bundle
//!
//! Artifacts go out one at a time in bundle order. The first failure stops
//! the sequence; attachments already delivered stay delivered.

use idv_common::api::{ArtifactRole, UploadBundle};
use thiserror::Error;
use tracing::{error, info};

use super::{AttachmentKind, AttachmentSink, DeliveryError, OutboundAttachment};

const CAPTION_BODY: &str = "Nueva verificación recibida.";

/// Forwarding stopped at `role`
#[derive(Debug, Error)]
#[error("Forwarding {role} failed after {delivered} deliveries: {source}")]
pub struct RelayFailure {
    pub role: ArtifactRole,
    /// How many artifacts were delivered before the failure
    pub delivered: usize,
    #[source]
    pub source: DeliveryError,
}

/// Caption tag identifying which artifact a message carries
pub fn caption_tag(role: ArtifactRole) -> &'static str {
    match role {
        ArtifactRole::IdFront => "[FRENTE]",
        ArtifactRole::IdBack => "[TRASERO]",
        ArtifactRole::Video => "[VIDEO SELFIE]",
    }
}

/// Full caption for one artifact of the request identified by `reference`
pub fn caption_for(role: ArtifactRole, reference: &str) -> String {
    format!("{} {} Ref: {}", caption_tag(role), CAPTION_BODY, reference)
}

fn kind_for(role: ArtifactRole) -> AttachmentKind {
    if role.is_photo() {
        AttachmentKind::Photo
    } else {
        AttachmentKind::Video
    }
}

/// Deliver every artifact of `bundle` through `sink`, in order
pub async fn forward_bundle(
    sink: &dyn AttachmentSink,
    bundle: &UploadBundle,
    reference: &str,
) -> Result<(), RelayFailure> {
    for (delivered, (role, file)) in bundle.parts().enumerate() {
        info!(reference, part = %role, bytes = file.len(), "Forwarding artifact");

        let attachment = OutboundAttachment {
            kind: kind_for(role),
            caption: caption_for(role, reference),
            file,
        };

        if let Err(source) = sink.deliver(attachment).await {
            error!(reference, part = %role, delivered, error = %source, "Forwarding failed");
            return Err(RelayFailure {
                role,
                delivered,
                source,
            });
        }
    }

    info!(reference, "All artifacts forwarded");
    Ok(())
}
