//! Outbound command encoding

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::Result;

/// Channel name announced in the listening handshake
pub const LISTENING_CHANNEL: &str = "widget";

/// Player command issued toward the embedded widget
///
/// Closed set: the widget accepts nothing else from this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Jump to an absolute position in seconds
    Seek {
        /// Target position in seconds (non-negative)
        seconds: f64,
    },

    /// Set volume on the widget's 0-100 scale
    SetVolume {
        /// Volume level (0-100)
        volume: u8,
    },

    /// Mute (`true`) or unmute (`false`)
    SetMute {
        /// Desired mute flag
        muted: bool,
    },

    /// Change playback speed
    SetRate {
        /// Rate multiplier (already validated against the allowed set)
        rate: f64,
    },

    /// Ask the widget to deliver a fresh info snapshot
    RequestSync,

    /// Replace the current item with another source
    Load {
        /// Platform-specific video id
        video_id: String,
    },
}

impl Command {
    /// Widget function name for this command
    ///
    /// `RequestSync` has no function; it is sent as the listening handshake.
    pub fn func_name(&self) -> Option<&'static str> {
        match self {
            Command::Play => Some("playVideo"),
            Command::Pause => Some("pauseVideo"),
            Command::Seek { .. } => Some("seekTo"),
            Command::SetVolume { .. } => Some("setVolume"),
            Command::SetMute { muted: true } => Some("mute"),
            Command::SetMute { muted: false } => Some("unMute"),
            Command::SetRate { .. } => Some("setPlaybackRate"),
            Command::RequestSync => None,
            Command::Load { .. } => Some("loadVideoById"),
        }
    }

    /// Build the wire message for this command
    ///
    /// `session_id` identifies this player instance in the handshake.
    pub fn to_message(&self, session_id: &str) -> OutboundMessage {
        let args: Vec<Value> = match self {
            Command::Seek { seconds } => vec![json!(seconds.max(0.0)), json!(true)],
            Command::SetVolume { volume } => vec![json!((*volume).min(100))],
            Command::SetRate { rate } => vec![json!(rate)],
            Command::Load { video_id } => vec![json!(video_id)],
            _ => Vec::new(),
        };

        match self.func_name() {
            Some(func) => OutboundMessage::Command {
                func: func.to_string(),
                args,
            },
            None => OutboundMessage::Listening {
                id: session_id.to_string(),
                channel: LISTENING_CHANNEL.to_string(),
            },
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Play => write!(f, "play"),
            Command::Pause => write!(f, "pause"),
            Command::Seek { seconds } => write!(f, "seek({:.2}s)", seconds),
            Command::SetVolume { volume } => write!(f, "volume({})", volume),
            Command::SetMute { muted } => write!(f, "mute({})", muted),
            Command::SetRate { rate } => write!(f, "rate({})", rate),
            Command::RequestSync => write!(f, "sync"),
            Command::Load { video_id } => write!(f, "load({})", video_id),
        }
    }
}

/// Structured message as posted across the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum OutboundMessage {
    /// `{"event":"command","func":..,"args":[..]}`
    #[serde(rename = "command")]
    Command {
        /// Widget function name
        func: String,
        /// Positional arguments
        args: Vec<Value>,
    },

    /// `{"event":"listening","id":..,"channel":..}`
    #[serde(rename = "listening")]
    Listening {
        /// Session identifier the widget echoes back
        id: String,
        /// Always [`LISTENING_CHANNEL`]
        channel: String,
    },
}

impl OutboundMessage {
    /// Serialize to the JSON text actually posted
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Function name when this is a command message
    pub fn func(&self) -> Option<&str> {
        match self {
            OutboundMessage::Command { func, .. } => Some(func),
            OutboundMessage::Listening { .. } => None,
        }
    }
}
