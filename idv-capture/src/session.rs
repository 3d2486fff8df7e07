//! Verification session state
//!
//! One [`Session`] lives for the whole page visit. Failures reset it in
//! place; dropping it releases the camera.

use idv_common::api::{Artifact, ArtifactRole, BundleBuilder, MissingParts, UploadBundle};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::media::{FacingMode, MediaStream};

/// Capture flow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Welcome,
    IdFront,
    IdBack,
    VideoSelfie,
    Uploading,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Welcome => "WELCOME",
            Step::IdFront => "ID_FRONT",
            Step::IdBack => "ID_BACK",
            Step::VideoSelfie => "VIDEO_SELFIE",
            Step::Uploading => "UPLOADING",
        }
    }

    /// Steps in which the user may switch cameras
    pub fn allows_camera_toggle(self) -> bool {
        matches!(self, Step::Welcome | Step::IdFront | Step::IdBack)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded document photo
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Photo {
    fn into_artifact(self, role: ArtifactRole) -> Artifact {
        Artifact::new(role.default_file_name(), "image/jpeg", self.jpeg)
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("bytes", &self.jpeg.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Recorded selfie video
#[derive(Clone, PartialEq, Eq)]
pub struct Video {
    pub bytes: Vec<u8>,
    /// Negotiated recorder MIME type, possibly with codec parameters
    pub mime_type: String,
}

impl Video {
    /// Container type without codec parameters
    pub fn container_type(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Upload file name matching the container
    pub fn file_name(&self) -> &'static str {
        if self.container_type() == "video/mp4" {
            "selfie.mp4"
        } else {
            "selfie.webm"
        }
    }

    fn into_artifact(self) -> Artifact {
        let file_name = self.file_name();
        let content_type = self.container_type().to_string();
        Artifact::new(file_name, content_type, self.bytes)
    }
}

impl fmt::Debug for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Video")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// One verification attempt
pub struct Session<S: MediaStream> {
    step: Step,
    facing_mode: FacingMode,
    has_audio: bool,
    stream: Option<S>,
    front: Option<Photo>,
    back: Option<Photo>,
    video: Option<Video>,
}

impl<S: MediaStream> Session<S> {
    pub fn new() -> Self {
        Self {
            step: Step::Welcome,
            facing_mode: FacingMode::Front,
            has_audio: false,
            stream: None,
            front: None,
            back: None,
            video: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// Whether the live stream carries audio
    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn front_photo(&self) -> Option<&Photo> {
        self.front.as_ref()
    }

    pub fn back_photo(&self) -> Option<&Photo> {
        self.back.as_ref()
    }

    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    pub(crate) fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    pub(crate) fn set_facing_mode(&mut self, facing_mode: FacingMode) {
        self.facing_mode = facing_mode;
    }

    /// Take ownership of a freshly acquired stream
    pub(crate) fn attach_stream(&mut self, stream: S, facing_mode: FacingMode, has_audio: bool) {
        self.release_stream();
        self.stream = Some(stream);
        self.facing_mode = facing_mode;
        self.has_audio = has_audio;
    }

    /// Stop and drop the live stream, if any
    pub(crate) fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.has_audio = false;
    }

    pub(crate) fn store_front(&mut self, photo: Photo) {
        self.front = Some(photo);
    }

    pub(crate) fn store_back(&mut self, photo: Photo) {
        self.back = Some(photo);
    }

    pub(crate) fn store_video(&mut self, video: Video) {
        self.video = Some(video);
    }

    /// Move the captured artifacts into an upload bundle
    ///
    /// Fails, listing every absent artifact, unless both photos and the video
    /// are present. The session's artifacts are consumed either way.
    pub(crate) fn take_bundle(&mut self) -> Result<UploadBundle, MissingParts> {
        BundleBuilder::new()
            .with(
                ArtifactRole::IdFront,
                self.front.take().map(|p| p.into_artifact(ArtifactRole::IdFront)),
            )
            .with(
                ArtifactRole::IdBack,
                self.back.take().map(|p| p.into_artifact(ArtifactRole::IdBack)),
            )
            .with(ArtifactRole::Video, self.video.take().map(Video::into_artifact))
            .build()
    }

    /// Back to WELCOME: discard artifacts, face front, release the camera
    pub(crate) fn reset(&mut self) {
        self.release_stream();
        self.step = Step::Welcome;
        self.facing_mode = FacingMode::Front;
        self.front = None;
        self.back = None;
        self.video = None;
    }
}

impl<S: MediaStream> Default for Session<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MediaStream> Drop for Session<S> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
