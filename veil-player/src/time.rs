//! Session-relative time
//!
//! Components never read the clock themselves. The session runtime measures
//! milliseconds since mount and hands that tick to every handler, which keeps
//! the controller deterministic under test.

use std::time::Duration;
use tokio::time::Instant;

/// Milliseconds since the session was mounted
pub type Millis = u64;

/// Converts between tokio instants and session ticks
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    /// Start counting from now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Current tick
    pub fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    /// Instant at which `tick` occurs
    pub fn instant_at(&self, tick: Millis) -> Instant {
        self.started + Duration::from_millis(tick)
    }
}
