//! Visibility Timer
//!
//! Auto-hides the control surface after a window of inactivity. Any viewer
//! activity restores full opacity at once and restarts the countdown.
//! Hiding only happens while playing with no menu open; otherwise the
//! expiry is spent and the controls stay up until the next activity.

use tracing::debug;

use crate::time::Millis;

#[derive(Debug, Clone)]
pub struct VisibilityTimer {
    window: Millis,
    visible: bool,
    deadline: Option<Millis>,
}

impl VisibilityTimer {
    pub fn new(window: Millis) -> Self {
        Self {
            window,
            visible: true,
            deadline: None,
        }
    }

    /// Viewer activity: show and restart the countdown
    pub fn activity(&mut self, now: Millis) {
        if !self.visible {
            debug!("Controls restored by activity");
        }
        self.visible = true;
        self.deadline = Some(now + self.window);
    }

    /// Start a countdown if none is running (playback started)
    pub fn arm(&mut self, now: Millis) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// Show without arming a countdown (paused, menus open, end screen)
    pub fn show(&mut self) {
        self.visible = true;
        self.deadline = None;
    }

    /// Handle a due deadline; returns `true` when the controls were hidden
    pub fn on_timer(&mut self, now: Millis, can_hide: bool) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if can_hide && self.visible {
                    self.visible = false;
                    debug!("Controls hidden after {}ms of inactivity", self.window);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 1.0 when shown, 0.0 when hidden (the fade itself is a CSS transition)
    pub fn opacity(&self) -> f64 {
        if self.visible {
            1.0
        } else {
            0.0
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.deadline
    }
}
