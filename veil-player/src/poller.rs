//! Sync Poller
//!
//! Some widgets only push state changes and never volunteer position
//! updates. The poller asks for a fresh info snapshot at a fixed period so
//! the seek bar keeps moving.
//!
//! The poller is a scoped handle: it owns its tokio interval, and dropping
//! it cancels the timer. The session task holds it for exactly as long as
//! the player is mounted.

use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

/// Fixed-period snapshot request timer
pub struct SyncPoller {
    interval: Interval,
    period: Duration,
    ticks: u64,
}

impl SyncPoller {
    /// Create a poller whose first tick completes immediately
    ///
    /// The immediate tick doubles as the initial listening handshake.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval(period);
        // A stalled loop should not produce a burst of catch-up polls
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            period,
            ticks: 0,
        }
    }

    /// Wait for the next poll; returns the running tick count
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.ticks += 1;
        debug!("Sync poll #{}", self.ticks);
        self.ticks
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
