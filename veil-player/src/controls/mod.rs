//! Control Surface
//!
//! Custom player chrome drawn over the widget: play/pause, seek bar,
//! volume, speed menu, fullscreen and (per skin) share. The surface holds
//! only presentation state. Playback values come from the
//! [`PlaybackStore`](crate::state::PlaybackStore).
//!
//! A seek drag is previewed locally; the widget hears about it once, on
//! release.

pub mod fullscreen;
pub mod keyboard;
pub mod skin;
pub mod visibility;

use serde::Serialize;

use crate::input::SeekPointer;
use crate::state::PlaybackState;

pub use fullscreen::{FullscreenPlatform, HostManagedFullscreen};
pub use keyboard::map_key;
pub use skin::{Capabilities, Skin};
pub use visibility::VisibilityTimer;

/// Rendered control surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsView {
    pub visible: bool,
    pub opacity: f64,
    pub speed_menu_open: bool,
    /// Position shown on the seek bar (drag preview while dragging)
    pub shown_time: f64,
    pub played_fraction: f64,
    pub buffered_fraction: f64,
    pub capabilities: Capabilities,
    pub playback_rates: Vec<f64>,
}

/// Presentation state of the control surface
#[derive(Debug, Clone, Default)]
pub struct ControlSurface {
    speed_menu_open: bool,
    /// Local seek-bar position during a drag
    drag_preview: Option<f64>,
}

impl ControlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a seek drag; returns the previewed time
    pub fn begin_drag(&mut self, pointer: &SeekPointer, duration: Option<f64>) -> Option<f64> {
        let duration = duration?;
        let time = pointer.time_for(duration);
        self.drag_preview = Some(time);
        Some(time)
    }

    /// Move the drag preview; nothing is sent
    pub fn update_drag(&mut self, pointer: &SeekPointer, duration: Option<f64>) -> Option<f64> {
        if self.drag_preview.is_none() {
            return None;
        }
        let time = pointer.time_for(duration?);
        self.drag_preview = Some(time);
        Some(time)
    }

    /// Finish the drag; returns the seek target to send
    pub fn end_drag(&mut self, pointer: &SeekPointer, duration: Option<f64>) -> Option<f64> {
        self.drag_preview.take()?;
        duration.map(|d| pointer.time_for(d))
    }

    pub fn cancel_drag(&mut self) {
        self.drag_preview = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_preview.is_some()
    }

    pub fn preview(&self) -> Option<f64> {
        self.drag_preview
    }

    pub fn toggle_speed_menu(&mut self) {
        self.speed_menu_open = !self.speed_menu_open;
    }

    /// Close any open menu; `true` if one was open
    pub fn close_menus(&mut self) -> bool {
        std::mem::take(&mut self.speed_menu_open)
    }

    pub fn menu_open(&self) -> bool {
        self.speed_menu_open
    }

    pub fn view(
        &self,
        state: &PlaybackState,
        visibility: &VisibilityTimer,
        skin: &Skin,
        rates: &[f64],
    ) -> ControlsView {
        let shown_time = self.drag_preview.unwrap_or(state.current_time);
        let played_fraction = match state.duration {
            Some(d) if d > 0.0 => (shown_time / d).clamp(0.0, 1.0),
            _ => 0.0,
        };
        ControlsView {
            visible: visibility.is_visible(),
            opacity: visibility.opacity(),
            speed_menu_open: self.speed_menu_open,
            shown_time,
            played_fraction,
            buffered_fraction: state.buffered_fraction,
            capabilities: skin.capabilities(),
            playback_rates: if skin.capabilities().speed_menu {
                rates.to_vec()
            } else {
                Vec::new()
            },
        }
    }
}
