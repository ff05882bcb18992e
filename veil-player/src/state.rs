//! Playback State Store
//!
//! Single source of truth for what the embedded widget is doing. Two writers
//! exist: the [`EventListener`](crate::listener::EventListener) (inbound
//! messages) and optimistic writes made by the controller when the viewer
//! issues a command. Nothing else mutates the store.
//!
//! # Invariants
//!
//! - `current_time <= duration` once duration is known
//! - entering `Ended` snaps `current_time` to `duration`
//! - `Error` is terminal: no later write changes status
//! - volume is 0-100, buffered fraction is 0.0-1.0

use serde::Serialize;
use veil_common::protocol::WidgetState;

use crate::time::Millis;

/// Position drift tolerated between `current_time` and `duration` at the end
pub const END_TOLERANCE_SECONDS: f64 = 0.5;

/// Local notion of the widget's player status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Loaded, never started
    Unstarted,
    /// A new source has been requested and not yet reported
    Loading,
    Playing,
    Paused,
    Buffering,
    Ended,
    /// Terminal widget failure
    Error,
}

impl PlaybackStatus {
    /// Viewer intends playback to be running
    ///
    /// Buffering counts: the widget will resume on its own.
    pub fn is_playing_intent(self) -> bool {
        matches!(self, PlaybackStatus::Playing | PlaybackStatus::Buffering)
    }

    pub fn is_terminal(self) -> bool {
        self == PlaybackStatus::Error
    }
}

impl From<WidgetState> for PlaybackStatus {
    fn from(state: WidgetState) -> Self {
        match state {
            WidgetState::Unstarted | WidgetState::Cued => PlaybackStatus::Unstarted,
            WidgetState::Ended => PlaybackStatus::Ended,
            WidgetState::Playing => PlaybackStatus::Playing,
            WidgetState::Paused => PlaybackStatus::Paused,
            WidgetState::Buffering => PlaybackStatus::Buffering,
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackStatus::Unstarted => "unstarted",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Buffering => "buffering",
            PlaybackStatus::Ended => "ended",
            PlaybackStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of the store, as rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Seconds from item start
    pub current_time: f64,
    /// Item length in seconds (`None` until the widget reports it)
    pub duration: Option<f64>,
    /// 0.0-1.0
    pub buffered_fraction: f64,
    pub muted: bool,
    /// 0-100
    pub volume: u8,
    pub playback_rate: f64,
    pub is_fullscreen: bool,
    /// Widget has completed its handshake
    pub ready: bool,
    /// Viewer is dragging the seek bar
    pub seeking: bool,
    /// Widget error code once `status == Error`
    pub error_code: Option<i64>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Unstarted,
            current_time: 0.0,
            duration: None,
            buffered_fraction: 0.0,
            muted: false,
            volume: 100,
            playback_rate: 1.0,
            is_fullscreen: false,
            ready: false,
            seeking: false,
            error_code: None,
        }
    }
}

impl PlaybackState {
    /// Fraction of the item played (0.0 when duration is unknown)
    pub fn played_fraction(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.current_time / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Position is at the end within [`END_TOLERANCE_SECONDS`]
    pub fn is_at_end(&self) -> bool {
        match self.duration {
            Some(d) => (d - self.current_time).abs() <= END_TOLERANCE_SECONDS,
            None => false,
        }
    }
}

/// Status change reported by a store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub old: PlaybackStatus,
    pub new: PlaybackStatus,
}

/// Owner of the [`PlaybackState`] for one player instance
#[derive(Debug, Default)]
pub struct PlaybackStore {
    state: PlaybackState,
    /// Tick of the most recent push-derived status write
    last_push_at: Option<Millis>,
    /// Tick at which a poll moved the status into `Ended`
    polled_end_at: Option<Millis>,
}

impl PlaybackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    /// Optimistic or reconciled status write
    ///
    /// Returns `None` when nothing changed (same status, or terminal error).
    pub fn set_status(&mut self, status: PlaybackStatus) -> Option<StatusChange> {
        let old = self.state.status;
        if old.is_terminal() || old == status {
            return None;
        }

        self.state.status = status;
        if status == PlaybackStatus::Ended {
            if let Some(d) = self.state.duration {
                self.state.current_time = d;
            }
        }
        Some(StatusChange { old, new: status })
    }

    /// Status carried by an `onStateChange` push
    pub fn apply_pushed_status(
        &mut self,
        status: PlaybackStatus,
        now: Millis,
    ) -> Option<StatusChange> {
        if self.state.status.is_terminal() {
            return None;
        }
        self.last_push_at = Some(now);
        self.set_status(status)
    }

    /// Status carried by a poll response
    ///
    /// Loses to a push received in the same tick.
    pub fn apply_polled_status(
        &mut self,
        status: PlaybackStatus,
        now: Millis,
    ) -> Option<StatusChange> {
        if self.last_push_at == Some(now) {
            return None;
        }
        let change = self.set_status(status);
        if matches!(change, Some(StatusChange { new: PlaybackStatus::Ended, .. })) {
            self.polled_end_at = Some(now);
        }
        change
    }

    /// Whether a poll ended playback in tick `now`
    ///
    /// A push in the same tick takes precedence, so such an end may still
    /// be retracted.
    pub fn ended_by_poll_at(&self, now: Millis) -> bool {
        self.state.status == PlaybackStatus::Ended && self.polled_end_at == Some(now)
    }

    /// Position write, clamped to `[0, duration]`
    ///
    /// Ignored while `Ended`: the end position is pinned to the duration.
    pub fn set_current_time(&mut self, seconds: f64) {
        if !seconds.is_finite() || self.state.status == PlaybackStatus::Ended {
            return;
        }
        self.state.current_time = self.clamp_time(seconds);
    }

    /// Duration write; zero means unknown
    ///
    /// Returns `true` if the duration became known for the first time.
    pub fn set_duration(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds <= 0.0 {
            return false;
        }
        let first = self.state.duration.is_none();
        self.state.duration = Some(seconds);
        self.state.current_time = self.state.current_time.min(seconds);
        if self.state.status == PlaybackStatus::Ended {
            self.state.current_time = seconds;
        }
        first
    }

    pub fn set_buffered_fraction(&mut self, fraction: f64) {
        if fraction.is_finite() {
            self.state.buffered_fraction = fraction.clamp(0.0, 1.0);
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.state.volume = volume.min(100);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.state.playback_rate = rate;
        }
    }

    pub fn set_fullscreen(&mut self, active: bool) {
        self.state.is_fullscreen = active;
    }

    /// Mark the handshake complete; `true` on the first call only
    pub fn set_ready(&mut self) -> bool {
        let first = !self.state.ready;
        self.state.ready = true;
        first
    }

    pub fn set_seeking(&mut self, seeking: bool) {
        self.state.seeking = seeking;
    }

    /// Enter the terminal error status
    pub fn fail(&mut self, code: i64) -> Option<StatusChange> {
        if self.state.status.is_terminal() {
            return None;
        }
        let old = self.state.status;
        self.state.status = PlaybackStatus::Error;
        self.state.error_code = Some(code);
        self.state.seeking = false;
        Some(StatusChange {
            old,
            new: PlaybackStatus::Error,
        })
    }

    /// Rewind to the start and resume (replay from the end screen)
    pub fn restart(&mut self) -> Option<StatusChange> {
        if self.state.status.is_terminal() {
            return None;
        }
        let old = self.state.status;
        self.state.status = PlaybackStatus::Playing;
        self.state.current_time = 0.0;
        self.polled_end_at = None;
        Some(StatusChange {
            old,
            new: PlaybackStatus::Playing,
        })
    }

    /// Fresh state for a newly loaded source
    ///
    /// Viewer preferences (volume, mute, rate, fullscreen) carry over, and
    /// the widget handshake stays complete.
    pub fn reset_for_new_source(&mut self) {
        let previous = std::mem::take(&mut self.state);
        self.state = PlaybackState {
            status: PlaybackStatus::Loading,
            muted: previous.muted,
            volume: previous.volume,
            playback_rate: previous.playback_rate,
            is_fullscreen: previous.is_fullscreen,
            ready: previous.ready,
            ..PlaybackState::default()
        };
        self.last_push_at = None;
        self.polled_end_at = None;
    }

    fn clamp_time(&self, seconds: f64) -> f64 {
        match self.state.duration {
            Some(d) => seconds.clamp(0.0, d),
            None => seconds.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let store = PlaybackStore::new();
        let s = store.state();
        assert_eq!(s.status, PlaybackStatus::Unstarted);
        assert_eq!(s.duration, None);
        assert_eq!(s.volume, 100);
        assert_eq!(s.playback_rate, 1.0);
        assert!(!s.ready);
    }

    #[test]
    fn test_same_status_is_not_a_change() {
        let mut store = PlaybackStore::new();
        assert!(store.set_status(PlaybackStatus::Playing).is_some());
        assert!(store.set_status(PlaybackStatus::Playing).is_none());
    }

    #[test]
    fn test_time_clamped_to_duration() {
        let mut store = PlaybackStore::new();
        store.set_duration(100.0);
        store.set_current_time(150.0);
        assert_eq!(store.state().current_time, 100.0);
        store.set_current_time(-4.0);
        assert_eq!(store.state().current_time, 0.0);
    }

    #[test]
    fn test_duration_shrink_clamps_time() {
        let mut store = PlaybackStore::new();
        store.set_current_time(80.0);
        assert!(store.set_duration(60.0));
        assert_eq!(store.state().current_time, 60.0);
        assert!(!store.set_duration(61.0));
    }

    #[test]
    fn test_zero_duration_stays_unknown() {
        let mut store = PlaybackStore::new();
        assert!(!store.set_duration(0.0));
        assert_eq!(store.state().duration, None);
    }

    #[test]
    fn test_ended_pins_time_to_duration() {
        let mut store = PlaybackStore::new();
        store.set_duration(200.0);
        store.set_current_time(199.7);
        store.set_status(PlaybackStatus::Ended);
        assert_eq!(store.state().current_time, 200.0);
        assert!(store.state().is_at_end());

        // Late snapshot time does not move the pinned end position
        store.set_current_time(199.2);
        assert_eq!(store.state().current_time, 200.0);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut store = PlaybackStore::new();
        store.set_status(PlaybackStatus::Playing);
        let change = store.fail(150).unwrap();
        assert_eq!(change.old, PlaybackStatus::Playing);
        assert!(store.set_status(PlaybackStatus::Paused).is_none());
        assert!(store.apply_pushed_status(PlaybackStatus::Playing, 5).is_none());
        assert!(store.restart().is_none());
        assert!(store.fail(2).is_none());
        assert_eq!(store.state().error_code, Some(150));
    }

    #[test]
    fn test_push_wins_over_poll_in_same_tick() {
        let mut store = PlaybackStore::new();
        store.apply_pushed_status(PlaybackStatus::Playing, 1000);
        assert!(store.apply_polled_status(PlaybackStatus::Paused, 1000).is_none());
        assert_eq!(store.status(), PlaybackStatus::Playing);

        // A later poll may correct the status
        assert!(store.apply_polled_status(PlaybackStatus::Paused, 1500).is_some());
        assert_eq!(store.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_polled_end_retractable_only_in_its_tick() {
        let mut store = PlaybackStore::new();
        store.apply_pushed_status(PlaybackStatus::Playing, 50);
        store.apply_polled_status(PlaybackStatus::Ended, 100);
        assert!(store.ended_by_poll_at(100));
        assert!(!store.ended_by_poll_at(150));

        let change = store.apply_pushed_status(PlaybackStatus::Playing, 100);
        assert_eq!(change.map(|c| c.old), Some(PlaybackStatus::Ended));
        assert!(!store.ended_by_poll_at(100));

        // A pushed end is never retractable
        store.apply_pushed_status(PlaybackStatus::Ended, 200);
        assert!(!store.ended_by_poll_at(200));
    }

    #[test]
    fn test_volume_and_buffer_clamped() {
        let mut store = PlaybackStore::new();
        store.set_volume(250);
        assert_eq!(store.state().volume, 100);
        store.set_buffered_fraction(1.7);
        assert_eq!(store.state().buffered_fraction, 1.0);
        store.set_buffered_fraction(f64::NAN);
        assert_eq!(store.state().buffered_fraction, 1.0);
    }

    #[test]
    fn test_reset_keeps_preferences() {
        let mut store = PlaybackStore::new();
        store.set_ready();
        store.set_volume(40);
        store.set_muted(true);
        store.set_playback_rate(1.5);
        store.set_duration(90.0);
        store.set_current_time(45.0);
        store.set_status(PlaybackStatus::Ended);

        store.reset_for_new_source();
        let s = store.state();
        assert_eq!(s.status, PlaybackStatus::Loading);
        assert_eq!(s.duration, None);
        assert_eq!(s.current_time, 0.0);
        assert_eq!(s.volume, 40);
        assert!(s.muted);
        assert_eq!(s.playback_rate, 1.5);
        assert!(s.ready);
    }

    #[test]
    fn test_played_fraction() {
        let mut store = PlaybackStore::new();
        assert_eq!(store.state().played_fraction(), 0.0);
        store.set_duration(200.0);
        store.set_current_time(50.0);
        assert_eq!(store.state().played_fraction(), 0.25);
    }
}
