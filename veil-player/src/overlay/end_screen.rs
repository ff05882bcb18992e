//! End-of-playback state machine
//!
//! ```text
//! Normal --(Ended)--> Showing --(Replay)---> Normal
//!                        |
//!                        +----(NextItem)--> Normal (new source)
//! ```
//!
//! While `Showing`, the end screen sits above every other layer and takes
//! all input, so the widget's own end-of-playback suggestions are never
//! visible or clickable.

use serde::Serialize;
use tracing::info;

use crate::source::NextSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndScreenState {
    Normal,
    Showing,
}

/// What the end screen offers, as rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndScreenView {
    /// Label of the chained item, if any
    pub next_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EndScreen {
    state: EndScreenState,
    next: Option<NextSource>,
    /// Completed playback sessions (number of times the screen was shown)
    shown: u64,
}

impl EndScreen {
    pub fn new(next: Option<NextSource>) -> Self {
        Self {
            state: EndScreenState::Normal,
            next,
            shown: 0,
        }
    }

    pub fn state(&self) -> EndScreenState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EndScreenState::Showing
    }

    /// Playback ended; `true` only for the transition into `Showing`
    pub fn on_ended(&mut self) -> bool {
        if self.state == EndScreenState::Showing {
            return false;
        }
        self.state = EndScreenState::Showing;
        self.shown += 1;
        info!("End screen shown (session {})", self.shown);
        true
    }

    /// Leave the end screen to replay the same item
    pub fn replay(&mut self) -> bool {
        if self.state != EndScreenState::Showing {
            return false;
        }
        self.state = EndScreenState::Normal;
        true
    }

    /// Leave the end screen for the chained item
    ///
    /// Without a chained item the screen stays up and `None` is returned.
    pub fn next_item(&mut self) -> Option<NextSource> {
        if self.state != EndScreenState::Showing {
            return None;
        }
        let next = self.next.take()?;
        self.state = EndScreenState::Normal;
        Some(next)
    }

    /// Withdraw a screen shown for an end that did not happen
    pub fn dismiss(&mut self) -> bool {
        if self.state != EndScreenState::Showing {
            return false;
        }
        self.state = EndScreenState::Normal;
        info!("End screen dismissed");
        true
    }

    /// Replace the chained item (host-supplied)
    pub fn set_next(&mut self, next: Option<NextSource>) {
        self.next = next;
    }

    pub fn next(&self) -> Option<&NextSource> {
        self.next.as_ref()
    }

    pub fn shown_count(&self) -> u64 {
        self.shown
    }

    pub fn view(&self) -> Option<EndScreenView> {
        self.is_active().then(|| EndScreenView {
            next_label: self.next.as_ref().map(|n| n.label.clone()),
        })
    }
}
