//! Capture Controller
//!
//! Step machine for one verification attempt:
//!
//! ```text
//! WELCOME → ID_FRONT → ID_BACK → VIDEO_SELFIE → UPLOADING → (redirect)
//!    ↑__________________ any failure: reset ____________________|
//! ```
//!
//! All operations take `&mut self`, so at most one acquisition or transition
//! is in flight per session. The only concurrent input is the manual stop of
//! a recording, delivered through a [`StopHandle`].

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::camera::acquire_camera;
use crate::config::CaptureConfig;
use crate::error::{CaptureError, ErrorNotice, Failure};
use crate::events::{CaptureEvent, EventBus};
use crate::media::{AcquireError, FacingMode, MediaPlatform, MediaStream, RecordingError};
use crate::recording::{record, select_encoding};
use crate::session::{Photo, Session, Step};
use crate::upload::{upload, UploadTransport};

const STATUS_STARTING_CAMERA: &str = "Iniciando cámara...";
const STATUS_CAMERA_READY: &str = "Cámara lista.";
const PROMPT_ID_FRONT: &str = "Centra el FRENTE de tu documento";
const PROMPT_ID_BACK: &str = "Ahora, centra la parte TRASERA";
const PROMPT_VIDEO: &str = "Prepárate para el video selfie";

/// Outcome of a controller operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Now in this step
    Advanced(Step),
    /// Upload succeeded; navigate to this URL
    Redirected(String),
    /// A failure sent the session back to WELCOME
    Reset { notice: ErrorNotice },
}

/// Requests a manual stop of the recording in progress
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: mpsc::Sender<()>,
}

impl StopHandle {
    pub fn stop(&self) {
        // A full channel already holds a pending stop
        let _ = self.tx.try_send(());
    }
}

pub struct CaptureController<P: MediaPlatform, U: UploadTransport> {
    platform: P,
    uploader: U,
    config: CaptureConfig,
    events: Arc<EventBus>,
    session: Session<P::Stream>,
    stop_tx: mpsc::Sender<()>,
    stop_rx: mpsc::Receiver<()>,
}

impl<P: MediaPlatform, U: UploadTransport> CaptureController<P, U> {
    /// New session in WELCOME, facing front, no stream
    pub fn new(platform: P, uploader: U, config: CaptureConfig, events: Arc<EventBus>) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        Self {
            platform,
            uploader,
            config,
            events,
            session: Session::new(),
            stop_tx,
            stop_rx,
        }
    }

    pub fn session(&self) -> &Session<P::Stream> {
        &self.session
    }

    pub fn step(&self) -> Step {
        self.session.step()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Page-load warm-up: front camera, no audio, behind the welcome prompt
    pub async fn initialize(&mut self) -> Result<Progress, CaptureError> {
        self.require_step("initialize", &[Step::Welcome])?;

        self.emit_step(Step::Welcome);
        self.emit_status(STATUS_STARTING_CAMERA);

        match self.acquire(FacingMode::Front, false).await {
            Ok(()) => {
                self.emit_status(STATUS_CAMERA_READY);
                Ok(Progress::Advanced(Step::Welcome))
            }
            Err(err) => {
                let notice = Failure::Camera(err).notice();
                error!(message = %notice.message, "Camera warm-up failed");
                self.emit(CaptureEvent::CameraView {
                    visible: false,
                    timestamp: Utc::now(),
                });
                self.emit_error(notice.clone());
                Ok(Progress::Reset { notice })
            }
        }
    }

    /// WELCOME → ID_FRONT on user confirmation
    pub async fn begin(&mut self) -> Result<Progress, CaptureError> {
        self.require_step("begin", &[Step::Welcome])?;

        self.enter(Step::IdFront);
        self.emit(CaptureEvent::CameraView {
            visible: true,
            timestamp: Utc::now(),
        });

        self.session.set_facing_mode(FacingMode::Rear);
        if let Err(err) = self.acquire(FacingMode::Rear, false).await {
            return Ok(self.fail(err.into()).await);
        }

        self.emit(CaptureEvent::CaptureControl {
            visible: true,
            timestamp: Utc::now(),
        });
        self.emit_status(PROMPT_ID_FRONT);
        Ok(Progress::Advanced(Step::IdFront))
    }

    /// Capture the current document side
    ///
    /// From ID_BACK this runs the selfie recording and the upload to
    /// completion before returning.
    pub async fn capture_photo(&mut self) -> Result<Progress, CaptureError> {
        let step = self.require_step("capture_photo", &[Step::IdFront, Step::IdBack])?;

        let frame = {
            let stream = self.session.stream().ok_or(CaptureError::CameraNotReady)?;
            let (width, height) = stream.dimensions();
            if width == 0 || height == 0 {
                return Err(CaptureError::CameraNotReady);
            }
            let frame = stream.current_frame().ok_or(CaptureError::CameraNotReady)?;
            if frame.is_empty() {
                return Err(CaptureError::CameraNotReady);
            }
            frame
        };

        let frame = if self.session.facing_mode().is_front() {
            frame.mirrored()
        } else {
            frame
        };

        let jpeg = match self.platform.encode_jpeg(&frame, self.config.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(err) => return Ok(self.fail(err.into()).await),
        };
        let photo = Photo {
            jpeg,
            width: frame.width(),
            height: frame.height(),
        };
        info!(
            %step,
            bytes = photo.jpeg.len(),
            width = photo.width,
            height = photo.height,
            "Photo captured"
        );

        if step == Step::IdFront {
            self.session.store_front(photo);
            self.enter(Step::IdBack);

            if !self.session.has_stream() {
                let facing = self.session.facing_mode();
                if let Err(err) = self.acquire(facing, false).await {
                    return Ok(self.fail(err.into()).await);
                }
            }

            self.emit_status(PROMPT_ID_BACK);
            return Ok(Progress::Advanced(Step::IdBack));
        }

        self.session.store_back(photo);
        Ok(self.run_video_selfie().await)
    }

    /// Switch between front and rear cameras
    pub async fn toggle_facing_mode(&mut self) -> Result<Progress, CaptureError> {
        let step = self.session.step();
        if !step.allows_camera_toggle() {
            return Err(CaptureError::InvalidStep {
                operation: "toggle_facing_mode",
                step,
            });
        }

        let next = self.session.facing_mode().toggled();
        let audio = self.session.has_audio();
        info!(?next, audio, "Switching camera");

        self.session.set_facing_mode(next);
        match self.acquire(next, audio).await {
            Ok(()) => Ok(Progress::Advanced(step)),
            Err(err) => Ok(self.fail(err.into()).await),
        }
    }

    /// VIDEO_SELFIE entry through upload
    async fn run_video_selfie(&mut self) -> Progress {
        self.enter(Step::VideoSelfie);
        self.emit(CaptureEvent::CaptureControl {
            visible: false,
            timestamp: Utc::now(),
        });
        self.emit_status(PROMPT_VIDEO);

        let ready_for_selfie = self.session.has_stream()
            && self.session.facing_mode().is_front()
            && self.session.has_audio();
        if !ready_for_selfie {
            self.session.set_facing_mode(FacingMode::Front);
            if let Err(err) = self.acquire(FacingMode::Front, true).await {
                return self.fail(err.into()).await;
            }
        }

        if !self.platform.recording_supported() {
            return self.fail(RecordingError::Unsupported.into()).await;
        }

        let Some(mime_type) = select_encoding(&self.config.encoding_preferences, |mime| {
            self.platform.is_type_supported(mime)
        })
        .map(str::to_string) else {
            let tried = self.config.encoding_preferences.join(", ");
            return self.fail(RecordingError::NoSupportedEncoding(tried).into()).await;
        };

        let recorder = match self.session.stream() {
            Some(stream) => self.platform.create_recorder(stream, &mime_type),
            None => Err(RecordingError::Recorder("no live stream".to_string())),
        };
        let mut recorder = match recorder {
            Ok(recorder) => recorder,
            Err(err) => return self.fail(err.into()).await,
        };

        let recorded = record(
            &mut recorder,
            &mime_type,
            self.config.recording_seconds,
            &mut self.stop_rx,
            &self.events,
        )
        .await;
        drop(recorder);

        match recorded {
            Ok(video) => self.session.store_video(video),
            Err(err) => return self.fail(err.into()).await,
        }

        self.run_upload().await
    }

    /// UPLOADING entry: release the camera and submit the bundle
    async fn run_upload(&mut self) -> Progress {
        self.enter(Step::Uploading);
        self.emit(CaptureEvent::CameraView {
            visible: false,
            timestamp: Utc::now(),
        });
        self.emit(CaptureEvent::Verifying {
            visible: true,
            timestamp: Utc::now(),
        });
        self.session.release_stream();

        let bundle = match self.session.take_bundle() {
            Ok(bundle) => bundle,
            Err(missing) => {
                warn!(%missing, "Upload skipped");
                return self.fail(Failure::Upload(missing.into())).await;
            }
        };

        match upload(&self.uploader, bundle, self.config.upload_timeout()).await {
            Ok(()) => {
                let url = self.config.success_url.clone();
                info!(%url, "Verification submitted, redirecting");
                self.emit(CaptureEvent::Redirect {
                    url: url.clone(),
                    timestamp: Utc::now(),
                });
                Progress::Redirected(url)
            }
            Err(err) => self.fail(err.into()).await,
        }
    }

    /// Error path: reset to WELCOME, report, warm the front camera again
    async fn fail(&mut self, failure: Failure) -> Progress {
        let notice = failure.notice();
        error!(step = %self.session.step(), error = %failure, "Capture flow failed, resetting");

        let was_uploading = self.session.step() == Step::Uploading;
        self.session.reset();

        if was_uploading {
            self.emit(CaptureEvent::Verifying {
                visible: false,
                timestamp: Utc::now(),
            });
        }
        self.emit(CaptureEvent::CaptureControl {
            visible: false,
            timestamp: Utc::now(),
        });
        self.emit(CaptureEvent::CameraView {
            visible: false,
            timestamp: Utc::now(),
        });
        self.emit_step(Step::Welcome);
        self.emit_error(notice.clone());

        // One attempt; a failure here is reported but does not reset again
        if let Err(err) = self.acquire(FacingMode::Front, false).await {
            error!(error = %err, "Camera reacquisition after reset failed");
            self.emit_error(Failure::Camera(err).notice());
        }

        Progress::Reset { notice }
    }

    /// Replace the live stream with a new one and bind it to the preview
    async fn acquire(&mut self, facing: FacingMode, audio: bool) -> Result<(), AcquireError> {
        self.session.release_stream();

        let acquired = acquire_camera(
            &self.platform,
            facing,
            audio,
            self.config.camera_ready_timeout(),
        )
        .await?;

        let mirrored = acquired.facing_mode.is_front();
        self.platform.bind_preview(&acquired.stream, mirrored);
        self.session
            .attach_stream(acquired.stream, acquired.facing_mode, acquired.has_audio);

        self.emit(CaptureEvent::PreviewBound {
            facing_mode: acquired.facing_mode,
            mirrored,
            has_audio: acquired.has_audio,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn require_step(
        &self,
        operation: &'static str,
        allowed: &[Step],
    ) -> Result<Step, CaptureError> {
        let step = self.session.step();
        if allowed.contains(&step) {
            Ok(step)
        } else {
            Err(CaptureError::InvalidStep { operation, step })
        }
    }

    fn enter(&mut self, step: Step) {
        info!(from = %self.session.step(), to = %step, "Step transition");
        self.session.set_step(step);
        self.emit_step(step);
    }

    fn emit(&self, event: CaptureEvent) {
        self.events.emit_lossy(event);
    }

    fn emit_step(&self, step: Step) {
        self.emit(CaptureEvent::StepEntered {
            step,
            timestamp: Utc::now(),
        });
    }

    fn emit_status(&self, text: &str) {
        self.emit(CaptureEvent::Status {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn emit_error(&self, notice: ErrorNotice) {
        self.emit(CaptureEvent::Error {
            notice,
            timestamp: Utc::now(),
        });
    }
}
