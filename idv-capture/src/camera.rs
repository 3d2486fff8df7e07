//! Camera acquisition with constraint fallbacks
//!
//! Fallback precedence per acquisition, each applied at most once:
//! 1. facing-mode constraint unsatisfiable → retry without it
//! 2. audio unavailable while requested → retry video-only
//!
//! Anything else is returned to the caller.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::media::{AcquireError, FacingMode, MediaPlatform, MediaStream, StreamRequest};

/// A ready stream plus what was actually granted
pub struct Acquired<S> {
    pub stream: S,
    /// Facing mode reported by the device, else the requested one
    pub facing_mode: FacingMode,
    pub has_audio: bool,
}

/// Acquire a stream and wait for its metadata
///
/// The caller must have released any previous stream.
pub async fn acquire_camera<P: MediaPlatform>(
    platform: &P,
    facing: FacingMode,
    audio: bool,
    ready_timeout: Duration,
) -> Result<Acquired<P::Stream>, AcquireError> {
    let mut request = StreamRequest {
        facing: Some(facing),
        audio,
    };
    let mut facing_relaxed = false;
    let mut audio_relaxed = false;

    let mut stream = loop {
        debug!(?request, "Requesting camera stream");
        match platform.acquire(request).await {
            Ok(stream) => break stream,
            Err(err) if !facing_relaxed && err.is_facing_constraint_failure() => {
                warn!(?facing, error = %err, "Facing mode unavailable, retrying with any camera");
                facing_relaxed = true;
                request.facing = None;
            }
            Err(err) if !audio_relaxed && request.audio && err.is_audio_failure() => {
                warn!(error = %err, "Audio unavailable, retrying video-only");
                audio_relaxed = true;
                request.audio = false;
            }
            Err(err) => {
                warn!(error = %err, "Camera acquisition failed");
                return Err(err);
            }
        }
    };

    match tokio::time::timeout(ready_timeout, stream.ready()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            stream.stop();
            return Err(err);
        }
        Err(_) => {
            stream.stop();
            return Err(AcquireError::NotReadable(format!(
                "stream metadata not available after {}s",
                ready_timeout.as_secs()
            )));
        }
    }

    let facing_mode = stream.facing_mode().unwrap_or(facing);
    let has_audio = request.audio && stream.has_audio();
    let (width, height) = stream.dimensions();
    info!(?facing_mode, has_audio, width, height, "Camera ready");

    Ok(Acquired {
        stream,
        facing_mode,
        has_audio,
    })
}
