//! Host callbacks
//!
//! Callbacks run synchronously inside the handler that triggered them, in
//! the same event-loop turn. They are never queued or batched by the player.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;

/// Progress report for the host page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// 0.0-1.0
    pub played_fraction: f64,
    pub played_seconds: f64,
}

/// Notifications the embedding page receives
///
/// Every method defaults to a no-op.
pub trait HostCallbacks: Send {
    /// Widget handshake completed (once per mount)
    fn on_ready(&mut self) {}

    /// Playback reached the end (once per playback session)
    fn on_ended(&mut self) {}

    /// Duration became known (once per source)
    fn on_duration_ready(&mut self, _seconds: f64) {}

    /// A snapshot moved the playback position
    fn on_progress(&mut self, _progress: Progress) {}

    /// Widget reported a terminal error
    fn on_error(&mut self, _code: i64) {}

    /// Viewer pressed share (share-enabled skin only)
    fn on_share(&mut self, _video_id: &str) {}
}

/// Host that ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl HostCallbacks for NoopHost {}

/// Callback as a value, for hosts that consume them asynchronously
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum HostEvent {
    Ready,
    Ended,
    DurationReady { seconds: f64 },
    Progress(Progress),
    Error { code: i64 },
    Share { video_id: String },
}

/// Host that forwards callbacks over a channel
///
/// The send itself happens synchronously inside the callback.
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: HostEvent) {
        // Receiver gone means the host stopped listening; nothing to do
        let _ = self.tx.send(event);
    }
}

impl HostCallbacks for ChannelHost {
    fn on_ready(&mut self) {
        self.emit(HostEvent::Ready);
    }

    fn on_ended(&mut self) {
        self.emit(HostEvent::Ended);
    }

    fn on_duration_ready(&mut self, seconds: f64) {
        self.emit(HostEvent::DurationReady { seconds });
    }

    fn on_progress(&mut self, progress: Progress) {
        self.emit(HostEvent::Progress(progress));
    }

    fn on_error(&mut self, code: i64) {
        self.emit(HostEvent::Error { code });
    }

    fn on_share(&mut self, video_id: &str) {
        self.emit(HostEvent::Share {
            video_id: video_id.to_string(),
        });
    }
}

/// Host that keeps every callback in memory
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<Vec<HostEvent>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks fired so far, oldest first
    pub fn events(&self) -> Vec<HostEvent> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// How many callbacks matched `pred`
    pub fn count(&self, pred: impl Fn(&HostEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: HostEvent) {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl HostCallbacks for RecordingHost {
    fn on_ready(&mut self) {
        self.push(HostEvent::Ready);
    }

    fn on_ended(&mut self) {
        self.push(HostEvent::Ended);
    }

    fn on_duration_ready(&mut self, seconds: f64) {
        self.push(HostEvent::DurationReady { seconds });
    }

    fn on_progress(&mut self, progress: Progress) {
        self.push(HostEvent::Progress(progress));
    }

    fn on_error(&mut self, code: i64) {
        self.push(HostEvent::Error { code });
    }

    fn on_share(&mut self, video_id: &str) {
        self.push(HostEvent::Share {
            video_id: video_id.to_string(),
        });
    }
}
