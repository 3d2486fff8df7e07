//! Platform media abstraction
//!
//! Platform-agnostic traits for camera streams, video recorders and the
//! still-image encoder. A browser bridge, a native kiosk backend and the
//! test fakes all implement the same [`MediaPlatform`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::Frame;

/// Which physical camera a stream comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FacingMode {
    /// Front camera, facing the user
    #[default]
    #[serde(rename = "user")]
    Front,
    /// Rear camera, facing away from the user
    #[serde(rename = "environment")]
    Rear,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    pub fn is_front(self) -> bool {
        self == FacingMode::Front
    }
}

/// Constraints for one stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    /// None means any camera
    pub facing: Option<FacingMode>,
    pub audio: bool,
}

/// Camera acquisition failures, as classified by the platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("No camera device found: {0}")]
    DeviceNotFound(String),

    /// A requested constraint cannot be satisfied by any device
    #[error("Constraint {constraint} cannot be satisfied")]
    Overconstrained { constraint: String },

    #[error("Audio input unavailable: {0}")]
    AudioUnavailable(String),

    /// Device exists but produced no usable video (busy, hardware error,
    /// metadata never arrived)
    #[error("Camera not readable: {0}")]
    NotReadable(String),

    #[error("Camera error: {0}")]
    Other(String),
}

/// Constraint name reported for an unsatisfiable facing mode
pub const FACING_MODE_CONSTRAINT: &str = "facingMode";

impl AcquireError {
    /// Retrying without a facing-mode constraint may succeed
    pub fn is_facing_constraint_failure(&self) -> bool {
        matches!(
            self,
            AcquireError::Overconstrained { constraint } if constraint == FACING_MODE_CONSTRAINT
        )
    }

    /// Retrying without audio may succeed
    pub fn is_audio_failure(&self) -> bool {
        matches!(self, AcquireError::AudioUnavailable(_))
    }
}

/// Still-image encoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Image encoding failed: {0}")]
pub struct EncodeError(pub String);

/// Recorder-side failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("Video recording is not supported on this platform")]
    Unsupported,

    #[error("None of the preferred video encodings is supported: {0}")]
    NoSupportedEncoding(String),

    #[error("Recorder failed: {0}")]
    Recorder(String),
}

/// Live camera stream
///
/// Exactly one stream is live per session. `stop` releases the device and
/// must be idempotent.
#[async_trait]
pub trait MediaStream: Send {
    /// Resolve once the stream's metadata (dimensions) is known
    async fn ready(&mut self) -> Result<(), AcquireError>;

    /// Native resolution; (0, 0) before metadata arrives
    fn dimensions(&self) -> (u32, u32);

    /// Facing mode reported by the device, when it reports one
    fn facing_mode(&self) -> Option<FacingMode>;

    fn has_audio(&self) -> bool;

    /// Current video frame at native resolution
    fn current_frame(&self) -> Option<Frame>;

    /// Stop all tracks and release the device
    fn stop(&mut self);
}

/// Recorder output, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One encoded fragment; may be empty
    Data(Vec<u8>),
    /// Recorder has flushed its last fragment
    Stopped,
    Error(String),
}

/// Video recorder bound to one stream
#[async_trait]
pub trait MediaRecorder: Send {
    fn start(&mut self) -> Result<(), RecordingError>;

    /// Request a stop; the recorder answers with a final `Stopped` event
    fn stop(&mut self);

    /// Next recorder event; None once the recorder is gone
    async fn next_event(&mut self) -> Option<RecorderEvent>;
}

/// Camera, recorder and encoder provider
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    type Stream: MediaStream;
    type Recorder: MediaRecorder;

    /// Request a new stream
    async fn acquire(&self, request: StreamRequest) -> Result<Self::Stream, AcquireError>;

    /// Attach `stream` to the on-screen preview
    fn bind_preview(&self, stream: &Self::Stream, mirrored: bool);

    /// Whether the platform can record video at all
    fn recording_supported(&self) -> bool;

    fn is_type_supported(&self, mime_type: &str) -> bool;

    fn create_recorder(
        &self,
        stream: &Self::Stream,
        mime_type: &str,
    ) -> Result<Self::Recorder, RecordingError>;

    /// Encode a frame as JPEG; `quality` in (0, 1]
    fn encode_jpeg(&self, frame: &Frame, quality: f32) -> Result<Vec<u8>, EncodeError>;
}
