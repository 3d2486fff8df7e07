//! Capture UI events and EventBus
//!
//! The controller never touches the page directly. Every visible change is
//! published as a [`CaptureEvent`]; the host renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ErrorNotice;
use crate::media::FacingMode;
use crate::session::Step;

/// Capture UI events
///
/// Serialized with a `type` tag so hosts can forward them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaptureEvent {
    /// The flow entered `step`
    StepEntered {
        step: Step,
        timestamp: DateTime<Utc>,
    },

    /// Prompt or status line text
    Status {
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Show or hide the camera view
    CameraView {
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    /// Show or hide the photo capture control
    CaptureControl {
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    /// A new stream is attached to the preview
    PreviewBound {
        facing_mode: FacingMode,
        mirrored: bool,
        has_audio: bool,
        timestamp: DateTime<Utc>,
    },

    CountdownStarted {
        seconds: u32,
        timestamp: DateTime<Utc>,
    },

    CountdownTick {
        remaining: u32,
        timestamp: DateTime<Utc>,
    },

    CountdownHidden {
        timestamp: DateTime<Utc>,
    },

    /// Show or hide the blocking "verifying" indicator
    Verifying {
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    Error {
        notice: ErrorNotice,
        timestamp: DateTime<Utc>,
    },

    /// Navigate away; the attempt succeeded
    Redirect {
        url: String,
        timestamp: DateTime<Utc>,
    },
}

impl CaptureEvent {
    /// Event type name, as serialized in the `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CaptureEvent::StepEntered { .. } => "StepEntered",
            CaptureEvent::Status { .. } => "Status",
            CaptureEvent::CameraView { .. } => "CameraView",
            CaptureEvent::CaptureControl { .. } => "CaptureControl",
            CaptureEvent::PreviewBound { .. } => "PreviewBound",
            CaptureEvent::CountdownStarted { .. } => "CountdownStarted",
            CaptureEvent::CountdownTick { .. } => "CountdownTick",
            CaptureEvent::CountdownHidden { .. } => "CountdownHidden",
            CaptureEvent::Verifying { .. } => "Verifying",
            CaptureEvent::Error { .. } => "Error",
            CaptureEvent::Redirect { .. } => "Redirect",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CaptureEvent::StepEntered { timestamp, .. }
            | CaptureEvent::Status { timestamp, .. }
            | CaptureEvent::CameraView { timestamp, .. }
            | CaptureEvent::CaptureControl { timestamp, .. }
            | CaptureEvent::PreviewBound { timestamp, .. }
            | CaptureEvent::CountdownStarted { timestamp, .. }
            | CaptureEvent::CountdownTick { timestamp, .. }
            | CaptureEvent::CountdownHidden { timestamp }
            | CaptureEvent::Verifying { timestamp, .. }
            | CaptureEvent::Error { timestamp, .. }
            | CaptureEvent::Redirect { timestamp, .. } => *timestamp,
        }
    }
}

/// Broadcast bus for capture events
///
/// Uses tokio::broadcast internally: every subscriber sees every event
/// emitted after it subscribed, and slow subscribers lose the oldest events
/// once `capacity` is exceeded.
pub struct EventBus {
    tx: broadcast::Sender<CaptureEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CaptureEvent,
    ) -> Result<usize, broadcast::error::SendError<CaptureEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CaptureEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
