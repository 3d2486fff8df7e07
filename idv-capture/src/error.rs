//! Error types for the capture controller
//!
//! Two families:
//! - [`CaptureError`]: an operation was refused and nothing changed; returned
//!   as `Err` to the caller.
//! - [`Failure`]: something went wrong mid-flow (camera, recorder,
//!   capability, upload).
//!   The controller converts it into the reset path and reports it as an
//!   [`ErrorNotice`] inside `Progress::Reset`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::{AcquireError, EncodeError, RecordingError};
use crate::session::Step;
use crate::upload::UploadError;

/// Operation rejected without a state change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// No stream, or the stream has not reported its dimensions yet
    #[error("Camera not ready: video dimensions unknown")]
    CameraNotReady,

    #[error("{operation} is not allowed in step {step}")]
    InvalidStep {
        operation: &'static str,
        step: Step,
    },
}

/// Category of a flow failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Camera,
    Capability,
    Upload,
}

/// User-facing description of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub kind: FailureKind,
    pub title: String,
    pub message: String,
    /// Blocking notices cannot be dismissed; the user must reload
    pub blocking: bool,
}

const CAMERA_TITLE: &str = "Error de Cámara";
const CAMERA_PERMISSION_MESSAGE: &str =
    "No se pudo acceder a la cámara. Por favor, asegúrate de dar permisos en tu navegador y recarga la página.";
const CAMERA_MISSING_MESSAGE: &str = "No se encontró ninguna cámara en este dispositivo.";
const CAMERA_BUSY_MESSAGE: &str = "La cámara no responde o está siendo usada por otra aplicación.";
const PHOTO_MESSAGE: &str = "No se pudo capturar la imagen. Por favor, inténtalo de nuevo.";
const RECORDER_MESSAGE: &str =
    "La grabación del video se interrumpió. Por favor, inténtalo de nuevo.";
const CAPABILITY_TITLE: &str = "Navegador no compatible";
const CAPABILITY_MESSAGE: &str =
    "Tu navegador no permite grabar video. Por favor, usa un navegador actualizado.";
const UPLOAD_TITLE: &str = "Error de Subida";

/// Mid-flow failure driving the reset path
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Camera(#[from] AcquireError),

    /// Recording is not possible on this platform
    #[error(transparent)]
    Capability(RecordingError),

    /// The recorder failed at runtime
    #[error(transparent)]
    Recorder(RecordingError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl From<RecordingError> for Failure {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::Unsupported | RecordingError::NoSupportedEncoding(_) => {
                Failure::Capability(err)
            }
            RecordingError::Recorder(_) => Failure::Recorder(err),
        }
    }
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Camera(_) | Failure::Encode(_) | Failure::Recorder(_) => {
                FailureKind::Camera
            }
            Failure::Capability(_) => FailureKind::Capability,
            Failure::Upload(_) => FailureKind::Upload,
        }
    }

    pub fn notice(&self) -> ErrorNotice {
        let (title, message, blocking) = match self {
            Failure::Camera(err) => {
                let message = match err {
                    AcquireError::DeviceNotFound(_) => CAMERA_MISSING_MESSAGE,
                    AcquireError::NotReadable(_) => CAMERA_BUSY_MESSAGE,
                    _ => CAMERA_PERMISSION_MESSAGE,
                };
                (CAMERA_TITLE, message.to_string(), true)
            }
            Failure::Encode(_) => (CAMERA_TITLE, PHOTO_MESSAGE.to_string(), false),
            Failure::Recorder(_) => (CAMERA_TITLE, RECORDER_MESSAGE.to_string(), false),
            Failure::Capability(_) => (CAPABILITY_TITLE, CAPABILITY_MESSAGE.to_string(), true),
            Failure::Upload(err) => (UPLOAD_TITLE, err.user_message(), false),
        };

        ErrorNotice {
            kind: self.kind(),
            title: title.to_string(),
            message,
            blocking,
        }
    }
}
