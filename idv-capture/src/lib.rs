//! idv-capture library - Capture Controller
//!
//! Drives one identity-verification attempt: document front photo, document
//! back photo, a timed selfie video, then a single three-part upload.
//!
//! The controller owns no hardware. Camera streams, recorders, the JPEG
//! encoder and the upload transport are injected through the traits in
//! [`media`] and [`upload`]; hosts observe progress through the
//! [`events::EventBus`].

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod frame;
pub mod media;
pub mod recording;
pub mod session;
pub mod upload;

pub use crate::config::CaptureConfig;
pub use crate::controller::{CaptureController, Progress, StopHandle};
pub use crate::error::{CaptureError, ErrorNotice, FailureKind};
pub use crate::events::{CaptureEvent, EventBus};
pub use crate::media::{FacingMode, MediaPlatform, MediaRecorder, MediaStream};
pub use crate::session::{Session, Step};
pub use crate::upload::{HttpUploadTransport, UploadTransport};
