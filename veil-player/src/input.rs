//! Host input events
//!
//! The host glue translates DOM events on the player container into these
//! values and applies the returned [`Disposition`] (`preventDefault` and
//! `stopPropagation` in the capture phase).

use serde::{Deserialize, Serialize};

/// Pointer position relative to the seek bar, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekPointer {
    pub pointer_x: f64,
    pub bar_left: f64,
    pub bar_width: f64,
}

impl SeekPointer {
    /// `clamp((x - left) / width, 0, 1)`; a zero-width bar maps to 0
    pub fn fraction(&self) -> f64 {
        if !(self.bar_width.is_finite() && self.bar_width > 0.0) || !self.pointer_x.is_finite() {
            return 0.0;
        }
        ((self.pointer_x - self.bar_left) / self.bar_width).clamp(0.0, 1.0)
    }

    /// Seek target for an item of `duration` seconds
    pub fn time_for(&self, duration: f64) -> f64 {
        self.fraction() * duration
    }
}

/// Where keyboard focus sits when a key is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    #[default]
    Page,
    /// `<input>`, `<textarea>` or a contenteditable element
    TextInput,
}

/// Key press, using DOM `KeyboardEvent.key` names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub focus: FocusTarget,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
            shift: false,
            focus: FocusTarget::Page,
        }
    }

    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Ctrl or Cmd held
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Control-surface action, from a button or a keyboard shortcut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    TogglePlay,
    Play,
    Pause,
    SeekTo { seconds: f64 },
    SeekBy { seconds: f64 },
    /// Jump to a fraction of the duration (number keys)
    SeekToFraction { fraction: f64 },
    SetVolume { volume: u8 },
    /// Relative volume change on the 0-100 scale
    AdjustVolume { delta: i16 },
    ToggleMute,
    SetRate { rate: f64 },
    ToggleSpeedMenu,
    CloseMenus,
    ToggleFullscreen,
    Replay,
    NextItem,
    Share,
}

/// Raw input delivered to the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Mouse movement anywhere over the player
    PointerMove,
    /// Click or tap at a position in percent of the player box
    PointerDown { x_percent: f64, y_percent: f64 },
    SeekDragStart { pointer: SeekPointer },
    SeekDragMove { pointer: SeekPointer },
    SeekDragEnd { pointer: SeekPointer },
    Key { key: KeyInput },
    ContextMenu,
    Copy,
    Cut,
    DragStart,
    SelectStart,
    TouchStart,
    TouchEnd,
    TouchCancel,
    /// Platform `fullscreenchange` notification
    FullscreenChanged { active: bool },
    /// Button press on the control surface or end screen
    Action { action: UserAction },
}

impl InputEvent {
    /// Counts as viewer activity for the visibility timer
    pub fn is_activity(&self) -> bool {
        !matches!(self, InputEvent::FullscreenChanged { .. })
    }
}

/// What the host should do with the original DOM event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Let the event continue normally
    Pass,
    /// Consumed by the player UI
    Handled,
    /// Blocked by the anti-piracy guard
    Suppressed,
}

impl Disposition {
    /// `preventDefault()` + `stopPropagation()` required
    pub fn blocks_default(self) -> bool {
        !matches!(self, Disposition::Pass)
    }
}
