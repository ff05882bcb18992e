//! Anti-Piracy Guard
//!
//! Capture-phase suppression of the browser affordances that make casual
//! copying easy: context menu, clipboard, drag, text selection and the
//! save / view-source / print shortcuts. On touch devices a long press
//! opens the context menu, so a touch held past the threshold has its
//! release suppressed as well.
//!
//! This is a deterrent only. Anyone with developer tools gets around it.

use tracing::debug;

use crate::input::{Disposition, InputEvent, KeyInput};
use crate::time::Millis;

/// Command-modified keys that are always blocked
const BLOCKED_SHORTCUTS: [&str; 3] = ["s", "u", "p"];

#[derive(Debug, Clone)]
pub struct AntiPiracyGuard {
    long_press: Millis,
    /// Pending long-press deadline while a touch is held
    press_deadline: Option<Millis>,
    /// Long-press threshold passed for the current touch
    press_fired: bool,
    suppressed: u64,
}

impl AntiPiracyGuard {
    pub fn new(long_press: Millis) -> Self {
        Self {
            long_press,
            press_deadline: None,
            press_fired: false,
            suppressed: 0,
        }
    }

    /// Inspect an event before anything else sees it
    ///
    /// `Some(Suppressed)` means the event must go no further. `None` lets
    /// the controller handle it.
    pub fn handle(&mut self, event: &InputEvent, now: Millis) -> Option<Disposition> {
        let suppress = match event {
            InputEvent::ContextMenu
            | InputEvent::Copy
            | InputEvent::Cut
            | InputEvent::DragStart
            | InputEvent::SelectStart => true,
            InputEvent::Key { key } => is_blocked_shortcut(key),
            InputEvent::TouchStart => {
                self.press_deadline = Some(now + self.long_press);
                self.press_fired = false;
                false
            }
            InputEvent::TouchEnd => {
                // The timer may not have been serviced yet
                let held = self.press_fired || self.press_deadline.is_some_and(|d| now >= d);
                self.clear_press();
                held
            }
            InputEvent::TouchCancel => {
                self.clear_press();
                false
            }
            _ => false,
        };

        if suppress {
            self.suppressed += 1;
            debug!("Guard suppressed {:?}", event);
            Some(Disposition::Suppressed)
        } else {
            None
        }
    }

    /// Long-press timer
    pub fn on_timer(&mut self, now: Millis) {
        if let Some(deadline) = self.press_deadline {
            if now >= deadline {
                self.press_deadline = None;
                self.press_fired = true;
                debug!("Long press detected");
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.press_deadline
    }

    pub fn long_press_active(&self) -> bool {
        self.press_fired
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    fn clear_press(&mut self) {
        self.press_deadline = None;
        self.press_fired = false;
    }
}

fn is_blocked_shortcut(key: &KeyInput) -> bool {
    key.has_command_modifier() && BLOCKED_SHORTCUTS.contains(&key.key.to_lowercase().as_str())
}
