//! Event Listener
//!
//! Inbound path from the embedded widget. Every message received by the
//! host frame is offered here; only messages from an allowed origin that
//! parse as a known widget event get through. Everything else is dropped
//! without an error: foreign traffic on the same message bus is normal.
//!
//! Recognized events are applied to the [`PlaybackStore`] and summarized in
//! an [`Applied`] record so the controller can fire host callbacks and drive
//! the end-of-playback state machine.

use serde_json::Value;
use tracing::{debug, warn};
use veil_common::protocol::{parse_inbound, InboundEvent, InfoSnapshot, OriginPolicy};

use crate::host::Progress;
use crate::state::{PlaybackStatus, PlaybackStore, StatusChange};
use crate::time::Millis;

/// Effects of applying one inbound event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// Status transition, if the event changed status
    pub status_change: Option<StatusChange>,
    /// First ready signal for this mount
    pub became_ready: bool,
    /// Duration became known for the first time
    pub duration_known: Option<f64>,
    /// Position moved by a snapshot
    pub progress: Option<Progress>,
    /// Widget failure code
    pub error: Option<i64>,
    /// A push overrode an end reported by a poll in the same tick
    pub retracted_end: bool,
}

impl Applied {
    /// Whether the event ended playback
    pub fn ended(&self) -> bool {
        matches!(
            self.status_change,
            Some(StatusChange {
                new: PlaybackStatus::Ended,
                ..
            })
        )
    }
}

/// Inbound message filter and normalizer
#[derive(Debug, Clone)]
pub struct EventListener {
    policy: OriginPolicy,
    allowed_rates: Vec<f64>,
    dropped: u64,
}

impl EventListener {
    pub fn new(policy: OriginPolicy, allowed_rates: Vec<f64>) -> Self {
        Self {
            policy,
            allowed_rates,
            dropped: 0,
        }
    }

    /// Filter by origin and parse; `None` for anything not ours
    pub fn accept(&mut self, origin: &str, data: &Value) -> Option<InboundEvent> {
        if !self.policy.accepts(origin) {
            self.dropped += 1;
            debug!("Dropped message from unexpected origin '{}'", origin);
            return None;
        }

        let event = parse_inbound(data);
        if event.is_none() {
            self.dropped += 1;
            debug!("Dropped unrecognized message from {}", origin);
        }
        event
    }

    /// Messages rejected so far (origin or shape)
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Normalize one event into store updates
    pub fn apply(&self, event: &InboundEvent, store: &mut PlaybackStore, now: Millis) -> Applied {
        let mut applied = Applied::default();
        if store.status().is_terminal() {
            return applied;
        }

        match event {
            InboundEvent::StateChange(state) => {
                let polled_end = store.ended_by_poll_at(now);
                applied.status_change =
                    store.apply_pushed_status(PlaybackStatus::from(*state), now);
                applied.retracted_end = polled_end && applied.status_change.is_some();
            }
            InboundEvent::InfoDelivery(snapshot) => {
                self.apply_snapshot(snapshot, store, now, &mut applied);
            }
            InboundEvent::Listening | InboundEvent::Ready => {
                applied.became_ready = store.set_ready();
            }
            InboundEvent::Error { code } => {
                warn!("Widget reported error code {}", code);
                applied.status_change = store.fail(*code);
                applied.error = Some(*code);
            }
        }

        if let Some(change) = applied.status_change {
            debug!("Status {} -> {}", change.old, change.new);
        }
        applied
    }

    fn apply_snapshot(
        &self,
        snapshot: &InfoSnapshot,
        store: &mut PlaybackStore,
        now: Millis,
        applied: &mut Applied,
    ) {
        // Duration first so the position clamps against the fresh value
        if let Some(duration) = snapshot.duration {
            if store.set_duration(duration) {
                applied.duration_known = Some(duration);
            }
        }

        if let Some(fraction) = snapshot.loaded_fraction {
            store.set_buffered_fraction(fraction);
        }

        if let Some(time) = snapshot.current_time {
            if store.state().seeking {
                debug!("Seek drag active, ignoring snapshot time {:.2}s", time);
            } else {
                store.set_current_time(time);
                if store.state().duration.is_some() {
                    let state = store.state();
                    applied.progress = Some(Progress {
                        played_fraction: state.played_fraction(),
                        played_seconds: state.current_time,
                    });
                }
            }
        }

        if let Some(volume) = snapshot.volume {
            store.set_volume(volume.round().clamp(0.0, 100.0) as u8);
        }
        if let Some(muted) = snapshot.muted {
            store.set_muted(muted);
        }
        if let Some(rate) = snapshot.playback_rate {
            if self.allowed_rates.iter().any(|r| (r - rate).abs() < 1e-6) {
                store.set_playback_rate(rate);
            } else {
                debug!("Ignoring snapshot rate {} outside allowed set", rate);
            }
        }

        if let Some(state) = snapshot.player_state {
            applied.status_change = store.apply_polled_status(PlaybackStatus::from(state), now);
        }
    }
}
