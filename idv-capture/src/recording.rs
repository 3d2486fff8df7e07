//! Timed selfie recording
//!
//! One recording pass: start the recorder, collect fragments, count down one
//! tick per second, stop exactly once (countdown expiry or manual stop), and
//! assemble the video when the recorder reports it has stopped.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, warn};

use crate::events::{CaptureEvent, EventBus};
use crate::media::{MediaRecorder, RecorderEvent, RecordingError};
use crate::session::Video;

const TICK: Duration = Duration::from_secs(1);

/// First preference the platform supports
pub fn select_encoding<'a, F>(preferences: &'a [String], is_supported: F) -> Option<&'a str>
where
    F: Fn(&str) -> bool,
{
    preferences
        .iter()
        .map(String::as_str)
        .find(|mime| is_supported(mime))
}

/// One-second countdown owned by a recording pass
pub struct Countdown {
    remaining: u32,
    interval: Interval,
    active: bool,
}

impl Countdown {
    /// First tick fires one period after start
    pub fn start(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            interval: interval_at(Instant::now() + TICK, TICK),
            active: seconds > 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Wait for the next tick and return the seconds left
    ///
    /// Deactivates itself on reaching zero.
    pub async fn tick(&mut self) -> u32 {
        self.interval.tick().await;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
        }
        self.remaining
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }
}

/// Run one recording pass to the recorder's stop event
///
/// Stop requests queued on `stop_rx` before the pass starts are discarded.
pub async fn record<R: MediaRecorder>(
    recorder: &mut R,
    mime_type: &str,
    seconds: u32,
    stop_rx: &mut mpsc::Receiver<()>,
    events: &EventBus,
) -> Result<Video, RecordingError> {
    while stop_rx.try_recv().is_ok() {
        debug!("Discarding stop request issued before recording");
    }

    recorder.start()?;
    info!(mime_type, seconds, "Recording started");

    events.emit_lossy(CaptureEvent::Status {
        text: "Grabando... Mantente visible".to_string(),
        timestamp: Utc::now(),
    });
    events.emit_lossy(CaptureEvent::CountdownStarted {
        seconds,
        timestamp: Utc::now(),
    });

    let mut countdown = Countdown::start(seconds);
    let mut fragments: Vec<Vec<u8>> = Vec::new();
    let mut stop_requested = false;

    if !countdown.is_active() {
        request_stop(recorder, &mut countdown, &mut stop_requested, events);
    }

    loop {
        tokio::select! {
            event = recorder.next_event() => match event {
                Some(RecorderEvent::Data(chunk)) => {
                    if !chunk.is_empty() {
                        fragments.push(chunk);
                    }
                }
                Some(RecorderEvent::Stopped) => break,
                Some(RecorderEvent::Error(message)) => {
                    warn!(%message, "Recorder error");
                    hide_countdown(&mut countdown, stop_requested, events);
                    return Err(RecordingError::Recorder(message));
                }
                None => {
                    warn!("Recorder closed before reporting stop");
                    hide_countdown(&mut countdown, stop_requested, events);
                    return Err(RecordingError::Recorder(
                        "recorder closed before reporting stop".to_string(),
                    ));
                }
            },
            remaining = countdown.tick(), if countdown.is_active() => {
                events.emit_lossy(CaptureEvent::CountdownTick {
                    remaining,
                    timestamp: Utc::now(),
                });
                if remaining == 0 {
                    info!("Countdown expired");
                    request_stop(recorder, &mut countdown, &mut stop_requested, events);
                }
            }
            Some(()) = stop_rx.recv(), if !stop_requested => {
                info!(remaining = countdown.remaining(), "Manual stop requested");
                request_stop(recorder, &mut countdown, &mut stop_requested, events);
            }
        }
    }

    let video = Video {
        bytes: fragments.concat(),
        mime_type: mime_type.to_string(),
    };
    info!(
        fragments = fragments.len(),
        bytes = video.bytes.len(),
        "Recording finished"
    );
    Ok(video)
}

fn hide_countdown(countdown: &mut Countdown, stop_requested: bool, events: &EventBus) {
    if !stop_requested {
        countdown.cancel();
        events.emit_lossy(CaptureEvent::CountdownHidden {
            timestamp: Utc::now(),
        });
    }
}

fn request_stop<R: MediaRecorder>(
    recorder: &mut R,
    countdown: &mut Countdown,
    stop_requested: &mut bool,
    events: &EventBus,
) {
    if *stop_requested {
        return;
    }
    *stop_requested = true;
    countdown.cancel();
    events.emit_lossy(CaptureEvent::CountdownHidden {
        timestamp: Utc::now(),
    });
    recorder.stop();
}
