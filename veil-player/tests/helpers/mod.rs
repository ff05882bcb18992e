//! Test helpers for Veil Player integration tests
//!
//! Provides a mounted session wired to recording doubles:
//! - RecordingSink: every message posted toward the widget
//! - RecordingHost: every host callback fired
//! - widget message builders with the expected origin

use std::time::Duration;

use serde_json::{json, Value};
use veil_common::config::PlayerConfig;
use veil_player::channel::RecordingSink;
use veil_player::controls::HostManagedFullscreen;
use veil_player::host::RecordingHost;
use veil_player::input::{InputEvent, UserAction};
use veil_player::{mount, Mount, MountOptions, PlayerIo, SessionHandle};

pub const WIDGET_ORIGIN: &str = "https://www.youtube.com";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

pub struct TestPlayer {
    pub session: SessionHandle,
    pub sink: RecordingSink,
    pub host: RecordingHost,
}

impl TestPlayer {
    pub fn mount(options: MountOptions) -> Self {
        let sink = RecordingSink::new();
        let host = RecordingHost::new();
        let io = PlayerIo {
            sink: Box::new(sink.clone()),
            host: Box::new(host.clone()),
            fullscreen: Box::new(HostManagedFullscreen),
        };
        let session = match mount(options, io) {
            Mount::Player(session) => session,
            Mount::Unavailable(p) => panic!("Expected a player, got placeholder: {}", p.reason),
        };
        Self { session, sink, host }
    }

    pub fn with_defaults() -> Self {
        Self::mount(options(PlayerConfig::default()))
    }

    pub fn widget(&self, data: Value) {
        self.session
            .deliver(WIDGET_ORIGIN, data)
            .expect("Session should accept messages");
    }

    pub fn state_change(&self, code: i64) {
        self.widget(state_change(code));
    }

    pub fn info(&self, info: Value) {
        self.widget(info_delivery(info));
    }

    pub async fn action(&self, action: UserAction) {
        self.session
            .input(InputEvent::Action { action })
            .await
            .expect("Session should accept input");
    }

    /// Funcs of command messages posted so far
    pub fn funcs(&self) -> Vec<String> {
        self.sink.funcs()
    }
}

pub fn options(config: PlayerConfig) -> MountOptions {
    MountOptions {
        source: VIDEO_ID.to_string(),
        viewer: Some("jordan@example.com".to_string()),
        config,
        seed: Some(7),
        ..Default::default()
    }
}

pub fn state_change(code: i64) -> Value {
    json!({"event": "onStateChange", "info": code})
}

pub fn info_delivery(info: Value) -> Value {
    json!({"event": "infoDelivery", "info": info})
}

/// Let the session task drain its queues without moving the paused clock
/// past any deadline
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time and let the session react
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}
