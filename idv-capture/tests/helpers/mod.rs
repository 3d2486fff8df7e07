//! Shared fakes for idv-capture integration tests
//!
//! - `FakePlatform`: cameras, recorder and JPEG encoder with switchable
//!   capabilities; counts live streams and recorder stops
//! - `FakeUploader`: records bundles and answers with scripted replies
//! - event helpers for draining the bus

#![allow(dead_code)]

use async_trait::async_trait;
use idv_capture::frame::Frame;
use idv_capture::media::{
    AcquireError, EncodeError, FacingMode, MediaPlatform, MediaRecorder, MediaStream,
    RecorderEvent, RecordingError, StreamRequest, FACING_MODE_CONSTRAINT,
};
use idv_capture::upload::{UploadError, UploadReply, UploadTransport};
use idv_capture::{CaptureConfig, CaptureController, CaptureEvent, EventBus};
use idv_common::api::UploadBundle;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

pub const FRAME_WIDTH: u32 = 4;
pub const FRAME_HEIGHT: u32 = 2;

/// The scene every fake camera sees: pixel (x, y) = [x, y, 7, 255]
pub fn scene() -> Frame {
    let mut pixels = Vec::new();
    for y in 0..FRAME_HEIGHT {
        for x in 0..FRAME_WIDTH {
            pixels.extend_from_slice(&[x as u8, y as u8, 7, 255]);
        }
    }
    Frame::new(FRAME_WIDTH, FRAME_HEIGHT, pixels).unwrap()
}

/// Fake JPEG: marker followed by the raw pixels
pub fn fake_jpeg(frame: &Frame) -> Vec<u8> {
    [b"JPEG".as_slice(), frame.pixels()].concat()
}

/// Scripted recorder misbehaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderFault {
    /// Reports an error event right after the first fragment
    ErrorAfterStart(String),
    /// Closes its event channel right after the first fragment
    ClosesAfterStart,
    /// `create_recorder` itself fails
    CreateFails(String),
}

#[derive(Debug)]
struct PlatformState {
    requests: Vec<StreamRequest>,
    scripted_failures: VecDeque<AcquireError>,
    previews: Vec<bool>,
    audio_available: bool,
    rear_available: bool,
    reports_facing: bool,
    never_ready: bool,
    zero_dimensions: bool,
    recording_supported: bool,
    supported_types: Vec<String>,
    encode_fails: bool,
    recorder_types: Vec<String>,
    recorder_fault: Option<RecorderFault>,
    max_live: usize,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            scripted_failures: VecDeque::new(),
            previews: Vec::new(),
            audio_available: true,
            rear_available: true,
            reports_facing: true,
            never_ready: false,
            zero_dimensions: false,
            recording_supported: true,
            supported_types: vec!["video/webm".to_string(), "video/mp4".to_string()],
            encode_fails: false,
            recorder_types: Vec::new(),
            recorder_fault: None,
            max_live: 0,
        }
    }
}

/// Scriptable media platform
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
    live: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
    recorder_stops: Arc<AtomicUsize>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(self, f: impl FnOnce(&mut PlatformState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn without_audio(self) -> Self {
        self.configure(|s| s.audio_available = false)
    }

    pub fn without_rear_camera(self) -> Self {
        self.configure(|s| s.rear_available = false)
    }

    /// Streams do not report a facing mode
    pub fn without_facing_reports(self) -> Self {
        self.configure(|s| s.reports_facing = false)
    }

    /// Streams never deliver metadata
    pub fn never_ready(self) -> Self {
        self.configure(|s| s.never_ready = true)
    }

    pub fn with_zero_dimensions(self) -> Self {
        self.configure(|s| s.zero_dimensions = true)
    }

    pub fn without_recording(self) -> Self {
        self.configure(|s| s.recording_supported = false)
    }

    pub fn with_supported_types(self, types: &[&str]) -> Self {
        let types = types.iter().map(|t| t.to_string()).collect();
        self.configure(|s| s.supported_types = types)
    }

    pub fn with_failing_encoder(self) -> Self {
        self.configure(|s| s.encode_fails = true)
    }

    pub fn with_recorder_fault(self, fault: RecorderFault) -> Self {
        self.configure(|s| s.recorder_fault = Some(fault))
    }

    /// Fail the next acquisitions with these errors, in order
    pub fn fail_next(self, errors: Vec<AcquireError>) -> Self {
        self.configure(|s| s.scripted_failures.extend(errors))
    }

    pub fn set_rear_available(&self, available: bool) {
        self.state.lock().unwrap().rear_available = available;
    }

    pub fn push_failure(&self, error: AcquireError) {
        self.state.lock().unwrap().scripted_failures.push_back(error);
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn previews(&self) -> Vec<bool> {
        self.state.lock().unwrap().previews.clone()
    }

    pub fn recorder_types(&self) -> Vec<String> {
        self.state.lock().unwrap().recorder_types.clone()
    }

    /// Streams granted and not yet stopped
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live streams observed
    pub fn max_live_streams(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    pub fn streams_granted(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn recorder_stops(&self) -> usize {
        self.recorder_stops.load(Ordering::SeqCst)
    }
}

pub struct FakeStream {
    facing: FacingMode,
    reports_facing: bool,
    audio: bool,
    never_ready: bool,
    zero_dimensions: bool,
    stopped: bool,
    live: Arc<AtomicUsize>,
}

impl FakeStream {
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[async_trait]
impl MediaStream for FakeStream {
    async fn ready(&mut self) -> Result<(), AcquireError> {
        if self.never_ready {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.zero_dimensions {
            (0, 0)
        } else {
            (FRAME_WIDTH, FRAME_HEIGHT)
        }
    }

    fn facing_mode(&self) -> Option<FacingMode> {
        self.reports_facing.then_some(self.facing)
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn current_frame(&self) -> Option<Frame> {
        if self.zero_dimensions {
            None
        } else {
            Some(scene())
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Recorder emitting two fragments (plus one empty) around a stop
pub struct FakeRecorder {
    tx: Option<mpsc::UnboundedSender<RecorderEvent>>,
    rx: mpsc::UnboundedReceiver<RecorderEvent>,
    fault: Option<RecorderFault>,
    stops: Arc<AtomicUsize>,
}

impl FakeRecorder {
    fn send(&self, event: RecorderEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

pub const FRAGMENT_HEAD: &[u8] = b"head-";
pub const FRAGMENT_TAIL: &[u8] = b"tail";

#[async_trait]
impl MediaRecorder for FakeRecorder {
    fn start(&mut self) -> Result<(), RecordingError> {
        self.send(RecorderEvent::Data(FRAGMENT_HEAD.to_vec()));
        match &self.fault {
            Some(RecorderFault::ErrorAfterStart(message)) => {
                self.send(RecorderEvent::Error(message.clone()));
            }
            Some(RecorderFault::ClosesAfterStart) => self.tx = None,
            _ => self.send(RecorderEvent::Data(Vec::new())),
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.send(RecorderEvent::Data(FRAGMENT_TAIL.to_vec()));
        self.send(RecorderEvent::Stopped);
    }

    async fn next_event(&mut self) -> Option<RecorderEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
impl MediaPlatform for FakePlatform {
    type Stream = FakeStream;
    type Recorder = FakeRecorder;

    async fn acquire(&self, request: StreamRequest) -> Result<FakeStream, AcquireError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);

        if let Some(error) = state.scripted_failures.pop_front() {
            return Err(error);
        }
        if request.facing == Some(FacingMode::Rear) && !state.rear_available {
            return Err(AcquireError::Overconstrained {
                constraint: FACING_MODE_CONSTRAINT.to_string(),
            });
        }
        if request.audio && !state.audio_available {
            return Err(AcquireError::AudioUnavailable("no microphone".to_string()));
        }

        let facing = match request.facing {
            Some(FacingMode::Rear) => FacingMode::Rear,
            _ => FacingMode::Front,
        };

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_live = state.max_live.max(live);
        self.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(FakeStream {
            facing,
            reports_facing: state.reports_facing,
            audio: request.audio,
            never_ready: state.never_ready,
            zero_dimensions: state.zero_dimensions,
            stopped: false,
            live: self.live.clone(),
        })
    }

    fn bind_preview(&self, _stream: &FakeStream, mirrored: bool) {
        self.state.lock().unwrap().previews.push(mirrored);
    }

    fn recording_supported(&self) -> bool {
        self.state.lock().unwrap().recording_supported
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .supported_types
            .iter()
            .any(|t| t == mime_type)
    }

    fn create_recorder(
        &self,
        stream: &FakeStream,
        mime_type: &str,
    ) -> Result<FakeRecorder, RecordingError> {
        assert!(!stream.is_stopped(), "recorder bound to a stopped stream");
        let mut state = self.state.lock().unwrap();
        state.recorder_types.push(mime_type.to_string());

        let fault = state.recorder_fault.clone();
        if let Some(RecorderFault::CreateFails(message)) = &fault {
            return Err(RecordingError::Recorder(message.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        Ok(FakeRecorder {
            tx: Some(tx),
            rx,
            fault,
            stops: self.recorder_stops.clone(),
        })
    }

    fn encode_jpeg(&self, frame: &Frame, quality: f32) -> Result<Vec<u8>, EncodeError> {
        assert!(quality > 0.0 && quality <= 1.0);
        if self.state.lock().unwrap().encode_fails {
            return Err(EncodeError("canvas tainted".to_string()));
        }
        Ok(fake_jpeg(frame))
    }
}

/// Scripted relay reply
#[derive(Debug, Clone)]
pub enum FakeReply {
    Status(u16, Vec<u8>),
    TransportError,
    /// Never answers
    Hang,
}

/// Recording upload transport; answers 200 unless scripted otherwise
#[derive(Clone, Default)]
pub struct FakeUploader {
    replies: Arc<Mutex<VecDeque<FakeReply>>>,
    sent: Arc<Mutex<Vec<UploadBundle>>>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(replies: Vec<FakeReply>) -> Self {
        let uploader = Self::default();
        uploader.replies.lock().unwrap().extend(replies);
        uploader
    }

    pub fn push_reply(&self, reply: FakeReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn sent(&self) -> Vec<UploadBundle> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransport for FakeUploader {
    async fn send(&self, bundle: UploadBundle) -> Result<UploadReply, UploadError> {
        self.sent.lock().unwrap().push(bundle);
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            None => Ok(UploadReply {
                status: 200,
                body: br#"{"success":true,"message":"Archivos enviados."}"#.to_vec(),
            }),
            Some(FakeReply::Status(status, body)) => Ok(UploadReply { status, body }),
            Some(FakeReply::TransportError) => {
                Err(UploadError::Transport("connection reset".to_string()))
            }
            Some(FakeReply::Hang) => {
                std::future::pending::<()>().await;
                Err(UploadError::Transport("unreachable".to_string()))
            }
        }
    }
}

pub type TestController = CaptureController<FakePlatform, FakeUploader>;

/// Controller plus an event subscription taken before any operation
pub fn controller_with(
    platform: FakePlatform,
    uploader: FakeUploader,
    config: CaptureConfig,
) -> (TestController, broadcast::Receiver<CaptureEvent>) {
    let events = Arc::new(EventBus::new(1024));
    let rx = events.subscribe();
    (CaptureController::new(platform, uploader, config, events), rx)
}

pub fn test_config() -> CaptureConfig {
    CaptureConfig {
        success_url: "https://example.com/verificacion-exitosa.html".to_string(),
        ..Default::default()
    }
}

/// Everything currently queued on the receiver
pub fn drain(rx: &mut broadcast::Receiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Event type names, in order
pub fn event_types(events: &[CaptureEvent]) -> Vec<&'static str> {
    events.iter().map(CaptureEvent::event_type).collect()
}

/// Countdown values emitted, in order
pub fn countdown_ticks(events: &[CaptureEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::CountdownTick { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect()
}

/// Drive a fresh controller to ID_BACK (front photo taken)
pub async fn advance_to_id_back(controller: &mut TestController) {
    controller.initialize().await.unwrap();
    controller.begin().await.unwrap();
    controller.capture_photo().await.unwrap();
}
