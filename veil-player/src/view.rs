//! Render model
//!
//! What the host draws. Published after every handled message, input and
//! timer so subscribers always see a consistent frame.

use serde::Serialize;

use crate::controls::ControlsView;
use crate::overlay::{EndScreenView, Layer, WatermarkMark};
use crate::state::PlaybackState;

/// Watermark layer contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkView {
    /// Masked viewer identity, identical in every mark
    pub text: String,
    /// Increments on each re-randomization
    pub generation: u64,
    pub marks: Vec<WatermarkMark>,
}

/// One complete frame of the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub video_id: String,
    pub state: PlaybackState,
    /// Bottom to top
    pub layers: Vec<Layer>,
    pub controls: ControlsView,
    pub watermark: WatermarkView,
    /// Present while the end screen is showing
    pub end_screen: Option<EndScreenView>,
    /// Widget failed; render the "not available" panel
    pub unavailable: bool,
}

/// Static panel shown when no usable source was supplied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub message: String,
    /// Why the source was rejected (for logs, not for viewers)
    pub reason: String,
}

impl Placeholder {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            message: "This video is not available".to_string(),
            reason: reason.into(),
        }
    }
}
