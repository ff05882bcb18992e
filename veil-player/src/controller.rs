//! Player Controller
//!
//! Owns every component of one mounted player and routes the three inputs
//! (widget messages, host input, timers) through named handlers. All
//! mutation of the [`PlaybackStore`] happens here, either through the
//! [`EventListener`] or as an optimistic write next to the command that
//! caused it.
//!
//! The controller is synchronous and never reads the clock. The session
//! runtime supplies the current [`Millis`] tick to every handler.

use rand::rngs::StdRng;
use serde_json::Value;
use tracing::{debug, info};
use veil_common::config::PlayerConfig;
use veil_common::protocol::{Command, OriginPolicy};

use crate::channel::{CommandChannel, MessageSink};
use crate::controls::{fullscreen, map_key, ControlSurface, FullscreenPlatform, Skin, VisibilityTimer};
use crate::guard::AntiPiracyGuard;
use crate::host::HostCallbacks;
use crate::identity::SessionIdentity;
use crate::input::{Disposition, InputEvent, KeyInput, UserAction};
use crate::listener::{Applied, EventListener};
use crate::overlay::{Compositor, EndScreen, LayerKind, WatermarkScheduler};
use crate::source::{NextSource, SourceRef};
use crate::state::{PlaybackStatus, PlaybackStore, StatusChange};
use crate::time::Millis;
use crate::view::{PlayerView, WatermarkView};

/// Tolerance when matching a requested rate against the allowed set
const RATE_EPSILON: f64 = 1e-6;

/// Host-side collaborators of one player
pub struct PlayerIo {
    pub sink: Box<dyn MessageSink>,
    pub host: Box<dyn HostCallbacks>,
    pub fullscreen: Box<dyn FullscreenPlatform>,
}

/// Everything needed to build a controller
pub struct ControllerSetup {
    pub session_id: String,
    pub config: PlayerConfig,
    pub source: SourceRef,
    pub next: Option<NextSource>,
    pub identity: SessionIdentity,
    pub rng: StdRng,
    /// Tick at which the player was mounted
    pub now: Millis,
}

pub struct PlayerController {
    config: PlayerConfig,
    source: SourceRef,
    identity: SessionIdentity,
    skin: Skin,

    store: PlaybackStore,
    channel: CommandChannel,
    listener: EventListener,
    compositor: Compositor,
    controls: ControlSurface,
    visibility: VisibilityTimer,
    guard: AntiPiracyGuard,

    host: Box<dyn HostCallbacks>,
    fullscreen: Box<dyn FullscreenPlatform>,
    torn_down: bool,
}

impl PlayerController {
    pub fn new(setup: ControllerSetup, io: PlayerIo) -> Self {
        let ControllerSetup {
            session_id,
            config,
            source,
            next,
            identity,
            rng,
            now,
        } = setup;

        let listener = EventListener::new(
            OriginPolicy::new(config.allowed_origins.iter()),
            config.playback_rates.clone(),
        );
        let watermark = WatermarkScheduler::new(
            config.watermark.clone(),
            config.timing.clone(),
            rng,
            now,
        );
        let compositor = Compositor::new(config.blockers.clone(), watermark, EndScreen::new(next));
        let visibility = VisibilityTimer::new(config.timing.hide_controls_after_ms);
        let guard = AntiPiracyGuard::new(config.timing.long_press_ms);
        let skin = Skin::new(config.skin);

        info!(
            "Player mounted for {} (skin {:?}, {} blockers)",
            source,
            config.skin,
            config.blockers.len()
        );

        Self {
            channel: CommandChannel::new(session_id, io.sink),
            config,
            source,
            identity,
            skin,
            store: PlaybackStore::new(),
            listener,
            compositor,
            controls: ControlSurface::new(),
            visibility,
            guard,
            host: io.host,
            fullscreen: io.fullscreen,
            torn_down: false,
        }
    }

    pub fn store(&self) -> &PlaybackStore {
        &self.store
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn visibility(&self) -> &VisibilityTimer {
        &self.visibility
    }

    pub fn listener(&self) -> &EventListener {
        &self.listener
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ---------------------------------------------------------------------
    // Inbound (widget -> store)
    // ---------------------------------------------------------------------

    /// Handle one message received by the host frame
    ///
    /// Returns `None` when the message was not from the widget or did not
    /// parse; such messages are dropped without side effects.
    pub fn handle_inbound(&mut self, origin: &str, data: &Value, now: Millis) -> Option<Applied> {
        if self.torn_down {
            return None;
        }
        let event = self.listener.accept(origin, data)?;
        let applied = self.listener.apply(&event, &mut self.store, now);

        if applied.became_ready {
            info!("Widget ready");
            self.host.on_ready();
        }
        if let Some(seconds) = applied.duration_known {
            self.host.on_duration_ready(seconds);
        }
        if let Some(progress) = applied.progress {
            self.host.on_progress(progress);
        }
        if let Some(code) = applied.error {
            self.controls.cancel_drag();
            self.controls.close_menus();
            self.visibility.show();
            self.host.on_error(code);
        }
        if applied.retracted_end && self.compositor.end_screen_mut().dismiss() {
            debug!("Polled end overridden by a push in the same tick");
        }
        if let Some(change) = applied.status_change {
            self.on_status_change(change, now);
        }

        Some(applied)
    }

    fn on_status_change(&mut self, change: StatusChange, now: Millis) {
        if change.new == PlaybackStatus::Ended {
            if self.compositor.end_screen_mut().on_ended() {
                self.controls.cancel_drag();
                self.controls.close_menus();
                self.store.set_seeking(false);
                self.visibility.show();
                self.host.on_ended();
            }
            return;
        }

        let was_playing = change.old.is_playing_intent();
        let is_playing = change.new.is_playing_intent();
        if is_playing && !was_playing {
            self.visibility.arm(now);
        } else if was_playing && !is_playing {
            self.visibility.show();
        }
    }

    // ---------------------------------------------------------------------
    // Host input
    // ---------------------------------------------------------------------

    /// Handle one DOM-derived input event
    pub fn handle_input(&mut self, event: InputEvent, now: Millis) -> Disposition {
        if self.torn_down {
            return Disposition::Pass;
        }
        if let Some(disposition) = self.guard.handle(&event, now) {
            return disposition;
        }
        if event.is_activity() {
            self.visibility.activity(now);
        }

        if self.compositor.end_screen().is_active() {
            return self.handle_end_screen_input(event, now);
        }

        match event {
            InputEvent::PointerMove => Disposition::Pass,
            InputEvent::PointerDown {
                x_percent,
                y_percent,
            } => {
                match self
                    .compositor
                    .hit_test(x_percent, y_percent, self.visibility.is_visible())
                {
                    LayerKind::InteractionCatcher => {
                        if !self.controls.close_menus() {
                            self.handle_action(UserAction::TogglePlay, now);
                        }
                    }
                    kind => debug!("Pointer down on {:?}", kind),
                }
                Disposition::Handled
            }
            InputEvent::SeekDragStart { pointer } => {
                if self.store.status().is_terminal() {
                    return Disposition::Handled;
                }
                if let Some(preview) = self.controls.begin_drag(&pointer, self.store.state().duration) {
                    debug!("Seek drag started at {:.2}s", preview);
                    self.store.set_seeking(true);
                }
                Disposition::Handled
            }
            InputEvent::SeekDragMove { pointer } => {
                self.controls.update_drag(&pointer, self.store.state().duration);
                Disposition::Handled
            }
            InputEvent::SeekDragEnd { pointer } => {
                let target = self.controls.end_drag(&pointer, self.store.state().duration);
                self.store.set_seeking(false);
                if let Some(seconds) = target {
                    self.seek_to(seconds);
                }
                Disposition::Handled
            }
            InputEvent::Key { key } => match map_key(&key, &self.config.controls) {
                Some(action) => {
                    self.handle_action(action, now);
                    Disposition::Handled
                }
                None => Disposition::Pass,
            },
            InputEvent::FullscreenChanged { active } => {
                fullscreen::reconcile(&mut self.store, active);
                Disposition::Pass
            }
            InputEvent::Action { action } => {
                self.handle_action(action, now);
                Disposition::Handled
            }
            // Guard already decided on these
            InputEvent::TouchStart
            | InputEvent::TouchEnd
            | InputEvent::TouchCancel
            | InputEvent::ContextMenu
            | InputEvent::Copy
            | InputEvent::Cut
            | InputEvent::DragStart
            | InputEvent::SelectStart => Disposition::Pass,
        }
    }

    /// The end screen takes all pointer and keyboard input
    fn handle_end_screen_input(&mut self, event: InputEvent, now: Millis) -> Disposition {
        match event {
            InputEvent::Key { key } => self.handle_end_screen_key(&key, now),
            InputEvent::Action { action } => {
                match action {
                    UserAction::Replay
                    | UserAction::NextItem
                    | UserAction::Share
                    | UserAction::ToggleFullscreen => self.handle_action(action, now),
                    other => debug!("End screen showing, ignoring {:?}", other),
                }
                Disposition::Handled
            }
            InputEvent::FullscreenChanged { active } => {
                fullscreen::reconcile(&mut self.store, active);
                Disposition::Pass
            }
            InputEvent::TouchStart | InputEvent::TouchEnd | InputEvent::TouchCancel => {
                Disposition::Pass
            }
            _ => Disposition::Handled,
        }
    }

    fn handle_end_screen_key(&mut self, key: &KeyInput, now: Millis) -> Disposition {
        if key.focus == crate::input::FocusTarget::TextInput {
            return Disposition::Pass;
        }
        match key.key.as_str() {
            " " | "Spacebar" | "Enter" => {
                self.handle_action(UserAction::Replay, now);
                Disposition::Handled
            }
            _ => Disposition::Suppressed,
        }
    }

    /// Apply one control-surface action
    pub fn handle_action(&mut self, action: UserAction, now: Millis) {
        if self.torn_down {
            return;
        }
        if !self.skin.allows(&action) {
            debug!("{:?} not offered by {:?} skin", action, self.skin.kind());
            return;
        }

        match action {
            UserAction::TogglePlay => {
                if self.store.status().is_playing_intent() {
                    self.pause();
                } else {
                    self.play(now);
                }
            }
            UserAction::Play => self.play(now),
            UserAction::Pause => self.pause(),
            UserAction::SeekTo { seconds } => self.seek_to(seconds),
            UserAction::SeekBy { seconds } => {
                let target = self.store.state().current_time + seconds;
                self.seek_to(target);
            }
            UserAction::SeekToFraction { fraction } => {
                if let Some(duration) = self.store.state().duration {
                    self.seek_to(fraction.clamp(0.0, 1.0) * duration);
                }
            }
            UserAction::SetVolume { volume } => self.set_volume(volume),
            UserAction::AdjustVolume { delta } => {
                let volume = i16::from(self.store.state().volume)
                    .saturating_add(delta)
                    .clamp(0, 100);
                self.set_volume(volume as u8);
            }
            UserAction::ToggleMute => {
                let muted = !self.store.state().muted;
                if self.command(Command::SetMute { muted }) {
                    self.store.set_muted(muted);
                }
            }
            UserAction::SetRate { rate } => self.set_rate(rate),
            UserAction::ToggleSpeedMenu => self.controls.toggle_speed_menu(),
            UserAction::CloseMenus => {
                self.controls.close_menus();
            }
            UserAction::ToggleFullscreen => {
                fullscreen::toggle(self.fullscreen.as_mut(), &mut self.store);
            }
            UserAction::Replay => self.replay(now),
            UserAction::NextItem => self.next_item(),
            UserAction::Share => self.host.on_share(self.source.video_id()),
        }
    }

    /// Send a command unless playback has failed; `true` if sent
    fn command(&mut self, command: Command) -> bool {
        if self.store.status().is_terminal() {
            debug!("Widget failed, suppressing {}", command);
            return false;
        }
        self.channel.send(command);
        true
    }

    fn play(&mut self, now: Millis) {
        // Redundant play is a no-op
        if self.store.status().is_playing_intent() {
            return;
        }
        if self.command(Command::Play) {
            self.store.set_status(PlaybackStatus::Playing);
            self.visibility.arm(now);
        }
    }

    fn pause(&mut self) {
        if !self.store.status().is_playing_intent() {
            return;
        }
        if self.command(Command::Pause) {
            self.store.set_status(PlaybackStatus::Paused);
            self.visibility.show();
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let target = match self.store.state().duration {
            Some(d) => seconds.clamp(0.0, d),
            None => seconds.max(0.0),
        };
        if self.command(Command::Seek { seconds: target }) {
            self.store.set_current_time(target);
        }
    }

    fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        if volume == self.store.state().volume {
            return;
        }
        if self.command(Command::SetVolume { volume }) {
            self.store.set_volume(volume);
        }
    }

    fn set_rate(&mut self, rate: f64) {
        let allowed = self
            .config
            .playback_rates
            .iter()
            .copied()
            .find(|r| (r - rate).abs() < RATE_EPSILON);
        let Some(rate) = allowed else {
            debug!("Rejected playback rate {}", rate);
            return;
        };
        self.controls.close_menus();
        if self.command(Command::SetRate { rate }) {
            self.store.set_playback_rate(rate);
        }
    }

    fn replay(&mut self, now: Millis) {
        if self.store.status().is_terminal() || !self.compositor.end_screen_mut().replay() {
            return;
        }
        info!("Replaying {}", self.source);
        self.store.restart();
        self.channel.send(Command::Seek { seconds: 0.0 });
        self.channel.send(Command::Play);
        self.visibility.activity(now);
    }

    fn next_item(&mut self) {
        if self.store.status().is_terminal() {
            return;
        }
        let Some(next) = self.compositor.end_screen_mut().next_item() else {
            debug!("No next item chained");
            return;
        };
        info!("Loading next item {} ({})", next.source, next.label);
        self.channel.send(Command::Load {
            video_id: next.source.video_id().to_string(),
        });
        self.store.reset_for_new_source();
        self.controls.cancel_drag();
        self.source = next.source;
    }

    /// Replace the item chained after the current one
    pub fn set_next(&mut self, next: Option<NextSource>) {
        self.compositor.end_screen_mut().set_next(next);
    }

    // ---------------------------------------------------------------------
    // Timers
    // ---------------------------------------------------------------------

    /// Sync Poller tick: ask the widget for a fresh snapshot
    pub fn poll_sync(&mut self, _now: Millis) {
        if self.torn_down || self.store.status().is_terminal() {
            return;
        }
        self.channel.send(Command::RequestSync);
    }

    /// Service every component deadline that has passed
    pub fn on_timer(&mut self, now: Millis) {
        if self.torn_down {
            return;
        }
        self.guard.on_timer(now);
        self.compositor.watermark_mut().on_timer(now);

        let can_hide = self.store.status().is_playing_intent()
            && !self.controls.menu_open()
            && !self.controls.is_dragging()
            && !self.compositor.end_screen().is_active();
        self.visibility.on_timer(now, can_hide);
    }

    /// Earliest pending component deadline
    pub fn next_deadline(&self) -> Option<Millis> {
        [
            self.visibility.next_deadline(),
            self.guard.next_deadline(),
            Some(self.compositor.watermark().next_deadline()),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // ---------------------------------------------------------------------
    // Rendering and lifecycle
    // ---------------------------------------------------------------------

    pub fn view(&self) -> PlayerView {
        let state = self.store.state();
        let watermark = self.compositor.watermark();
        PlayerView {
            video_id: self.source.video_id().to_string(),
            state: state.clone(),
            layers: self.compositor.layers(self.visibility.is_visible()),
            controls: self.controls.view(
                state,
                &self.visibility,
                &self.skin,
                &self.config.playback_rates,
            ),
            watermark: WatermarkView {
                text: self.identity.watermark_text().to_string(),
                generation: watermark.generation(),
                marks: watermark.marks().to_vec(),
            },
            end_screen: self.compositor.end_screen().view(),
            unavailable: state.status.is_terminal(),
        }
    }

    /// Close the channel; nothing is sent or applied afterwards
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.channel.close();
        self.controls.cancel_drag();
        info!(
            "Player torn down ({} commands sent, {} messages dropped)",
            self.channel.sent_count(),
            self.listener.dropped_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingSink;
    use crate::controls::HostManagedFullscreen;
    use crate::host::{HostEvent, RecordingHost};
    use crate::input::SeekPointer;
    use rand::SeedableRng;
    use serde_json::json;
    use veil_common::config::SkinKind;

    const ORIGIN: &str = "https://www.youtube.com";

    struct Harness {
        player: PlayerController,
        sink: RecordingSink,
        host: RecordingHost,
    }

    fn harness_with(config: PlayerConfig, next: Option<NextSource>) -> Harness {
        let sink = RecordingSink::new();
        let host = RecordingHost::new();
        let player = PlayerController::new(
            ControllerSetup {
                session_id: "s1".to_string(),
                config,
                source: SourceRef::parse("dQw4w9WgXcQ").unwrap(),
                next,
                identity: SessionIdentity::from_viewer(Some("jordan@example.com")),
                rng: StdRng::seed_from_u64(11),
                now: 0,
            },
            PlayerIo {
                sink: Box::new(sink.clone()),
                host: Box::new(host.clone()),
                fullscreen: Box::new(HostManagedFullscreen),
            },
        );
        Harness { player, sink, host }
    }

    fn harness() -> Harness {
        harness_with(PlayerConfig::default(), None)
    }

    impl Harness {
        fn push_state(&mut self, code: i64, now: Millis) {
            self.player
                .handle_inbound(ORIGIN, &json!({"event": "onStateChange", "info": code}), now);
        }

        fn snapshot(&mut self, info: Value, now: Millis) {
            self.player
                .handle_inbound(ORIGIN, &json!({"event": "infoDelivery", "info": info}), now);
        }

        fn action(&mut self, action: UserAction, now: Millis) -> Disposition {
            self.player.handle_input(InputEvent::Action { action }, now)
        }

        fn status(&self) -> PlaybackStatus {
            self.player.store().status()
        }
    }

    fn bar(x: f64) -> SeekPointer {
        SeekPointer {
            pointer_x: x,
            bar_left: 0.0,
            bar_width: 100.0,
        }
    }

    #[test]
    fn test_alternating_play_pause_is_optimistic() {
        let mut h = harness();
        for i in 0..6 {
            h.action(UserAction::TogglePlay, i * 10);
            let expected = if i % 2 == 0 {
                PlaybackStatus::Playing
            } else {
                PlaybackStatus::Paused
            };
            assert_eq!(h.status(), expected);
        }
        assert_eq!(
            h.sink.funcs(),
            vec!["playVideo", "pauseVideo", "playVideo", "pauseVideo", "playVideo", "pauseVideo"]
        );
    }

    #[test]
    fn test_redundant_play_sends_nothing() {
        let mut h = harness();
        h.action(UserAction::Play, 0);
        h.action(UserAction::Play, 1);
        h.action(UserAction::Pause, 2);
        h.action(UserAction::Pause, 3);
        assert_eq!(h.sink.funcs(), vec!["playVideo", "pauseVideo"]);
    }

    #[test]
    fn test_snapshot_corrects_optimistic_write() {
        let mut h = harness();
        h.action(UserAction::Play, 0);
        assert_eq!(h.status(), PlaybackStatus::Playing);
        // Widget refused (autoplay policy) and reports paused
        h.snapshot(json!({"playerState": 2}), 500);
        assert_eq!(h.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_ended_fires_once() {
        let mut h = harness();
        h.snapshot(json!({"duration": 60.0, "currentTime": 10.0}), 0);
        h.push_state(1, 10);
        h.push_state(0, 20);
        h.push_state(0, 30);
        h.snapshot(json!({"playerState": 0}), 40);

        assert_eq!(h.host.count(|e| *e == HostEvent::Ended), 1);
        assert!(h.player.compositor().end_screen().is_active());
        assert_eq!(h.player.store().state().current_time, 60.0);
    }

    #[test]
    fn test_push_after_polled_end_in_same_tick_dismisses_end_screen() {
        let mut h = harness();
        h.snapshot(json!({"duration": 60.0, "currentTime": 10.0}), 0);
        h.push_state(1, 10);

        h.snapshot(json!({"playerState": 0}), 100);
        assert!(h.player.compositor().end_screen().is_active());
        h.push_state(1, 100);
        assert_eq!(h.status(), PlaybackStatus::Playing);
        assert!(!h.player.compositor().end_screen().is_active());
        assert!(h.player.view().end_screen.is_none());

        // The real end still opens the screen and notifies the host
        h.push_state(0, 200);
        assert!(h.player.compositor().end_screen().is_active());
        assert_eq!(h.host.count(|e| *e == HostEvent::Ended), 2);
    }

    #[test]
    fn test_push_wins_over_poll_in_same_tick() {
        let mut h = harness();
        h.push_state(1, 100);
        h.snapshot(json!({"playerState": 2}), 100);
        assert_eq!(h.status(), PlaybackStatus::Playing);
        h.snapshot(json!({"playerState": 2}), 600);
        assert_eq!(h.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_drag_ignores_snapshots_and_seeks_once() {
        let mut h = harness();
        h.snapshot(json!({"duration": 200.0, "currentTime": 10.0}), 0);
        h.sink.clear();

        h.player.handle_input(InputEvent::SeekDragStart { pointer: bar(25.0) }, 10);
        for (i, x) in [30.0, 40.0, 50.0].into_iter().enumerate() {
            h.player
                .handle_input(InputEvent::SeekDragMove { pointer: bar(x) }, 20 + i as u64);
            h.snapshot(json!({"currentTime": 11.0 + i as f64}), 30 + i as u64);
            assert_eq!(h.player.store().state().current_time, 10.0);
        }
        assert_eq!(h.player.view().controls.shown_time, 100.0);
        assert!(h.sink.messages().iter().all(|m| m.func() != Some("seekTo")));

        h.player.handle_input(InputEvent::SeekDragEnd { pointer: bar(60.0) }, 100);
        let seeks: Vec<_> = h
            .sink
            .messages()
            .into_iter()
            .filter(|m| m.func() == Some("seekTo"))
            .collect();
        assert_eq!(seeks.len(), 1);
        assert_eq!(h.player.store().state().current_time, 120.0);
        assert!(!h.player.store().state().seeking);
    }

    #[test]
    fn test_replay_sends_seek_then_play() {
        let mut h = harness();
        h.snapshot(json!({"duration": 30.0}), 0);
        h.push_state(1, 10);
        h.push_state(0, 20);
        h.sink.clear();

        h.action(UserAction::Replay, 30);
        assert_eq!(h.sink.funcs(), vec!["seekTo", "playVideo"]);
        assert_eq!(h.status(), PlaybackStatus::Playing);
        assert_eq!(h.player.store().state().current_time, 0.0);
        assert!(!h.player.compositor().end_screen().is_active());

        // A second playback session may end again
        h.push_state(0, 40);
        assert_eq!(h.host.count(|e| *e == HostEvent::Ended), 2);
    }

    #[test]
    fn test_end_screen_swallows_input() {
        let mut h = harness();
        h.push_state(1, 0);
        h.push_state(0, 10);
        h.sink.clear();

        let d = h.player.handle_input(
            InputEvent::Key {
                key: KeyInput::new("k"),
            },
            20,
        );
        assert_eq!(d, Disposition::Suppressed);
        assert_eq!(h.action(UserAction::TogglePlay, 30), Disposition::Handled);
        let d = h.player.handle_input(
            InputEvent::PointerDown {
                x_percent: 50.0,
                y_percent: 50.0,
            },
            40,
        );
        assert_eq!(d, Disposition::Handled);
        assert!(h.sink.messages().is_empty());

        h.player.handle_input(
            InputEvent::Key {
                key: KeyInput::new("Enter"),
            },
            50,
        );
        assert_eq!(h.sink.funcs(), vec!["seekTo", "playVideo"]);
    }

    #[test]
    fn test_next_item_loads_chained_source() {
        let next = NextSource::parse("https://youtu.be/abcdefghijk", "Part 2").unwrap();
        let mut h = harness_with(PlayerConfig::default(), Some(next));
        h.snapshot(json!({"duration": 30.0}), 0);
        h.push_state(0, 10);
        h.sink.clear();

        h.action(UserAction::NextItem, 20);
        let messages = h.sink.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].func(), Some("loadVideoById"));
        assert_eq!(h.player.source().video_id(), "abcdefghijk");
        assert_eq!(h.status(), PlaybackStatus::Loading);
        assert_eq!(h.player.store().state().duration, None);

        // New source reports its own duration
        h.snapshot(json!({"duration": 45.0}), 30);
        assert_eq!(
            h.host.count(|e| matches!(e, HostEvent::DurationReady { .. })),
            2
        );
    }

    #[test]
    fn test_next_item_without_chain_is_ignored() {
        let mut h = harness();
        h.push_state(0, 0);
        h.sink.clear();
        h.action(UserAction::NextItem, 10);
        assert!(h.sink.messages().is_empty());
        assert!(h.player.compositor().end_screen().is_active());
    }

    #[test]
    fn test_error_is_terminal_and_suppresses_commands() {
        let mut h = harness();
        h.player
            .handle_inbound(ORIGIN, &json!({"event": "onError", "info": 150}), 0);
        assert_eq!(h.status(), PlaybackStatus::Error);
        assert!(h.player.view().unavailable);
        assert_eq!(h.host.events(), vec![HostEvent::Error { code: 150 }]);

        h.sink.clear();
        h.action(UserAction::Play, 10);
        h.action(UserAction::SeekTo { seconds: 5.0 }, 20);
        h.player.poll_sync(30);
        h.push_state(1, 40);
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.status(), PlaybackStatus::Error);
    }

    #[test]
    fn test_ready_and_duration_callbacks_once() {
        let mut h = harness();
        h.player
            .handle_inbound(ORIGIN, &json!({"event": "onReady"}), 0);
        h.player
            .handle_inbound(ORIGIN, &json!({"event": "listening"}), 10);
        h.snapshot(json!({"duration": 90.0}), 20);
        h.snapshot(json!({"duration": 90.0}), 30);

        assert_eq!(h.host.count(|e| *e == HostEvent::Ready), 1);
        assert_eq!(
            h.host.events().last(),
            Some(&HostEvent::DurationReady { seconds: 90.0 })
        );
    }

    #[test]
    fn test_progress_callback() {
        let mut h = harness();
        h.snapshot(json!({"duration": 100.0, "currentTime": 25.0}), 0);
        let progress: Vec<_> = h
            .host
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].played_fraction, 0.25);
        assert_eq!(progress[0].played_seconds, 25.0);
    }

    #[test]
    fn test_foreign_message_is_inert() {
        let mut h = harness();
        let before = h.player.view();
        assert!(h
            .player
            .handle_inbound("https://evil.example", &json!({"event": "onStateChange", "info": 1}), 0)
            .is_none());
        assert!(h.player.handle_inbound(ORIGIN, &json!({"foo": 1}), 0).is_none());
        assert_eq!(h.player.view(), before);
    }

    #[test]
    fn test_keyboard_disabled_in_text_input() {
        let mut h = harness();
        let d = h.player.handle_input(
            InputEvent::Key {
                key: KeyInput::new(" ").in_text_input(),
            },
            0,
        );
        assert_eq!(d, Disposition::Pass);
        assert!(h.sink.messages().is_empty());

        let d = h.player.handle_input(
            InputEvent::Key {
                key: KeyInput::new(" "),
            },
            10,
        );
        assert_eq!(d, Disposition::Handled);
        assert_eq!(h.sink.funcs(), vec!["playVideo"]);
    }

    #[test]
    fn test_visibility_hides_while_playing_only() {
        let mut h = harness();
        h.player.handle_input(InputEvent::PointerMove, 0);
        h.player.on_timer(3000);
        // Not playing: stays visible
        assert_eq!(h.player.view().controls.opacity, 1.0);

        h.action(UserAction::Play, 4000);
        assert_eq!(h.player.next_deadline().map(|d| d <= 7000), Some(true));
        h.player.on_timer(6999);
        assert_eq!(h.player.view().controls.opacity, 1.0);
        h.player.on_timer(7000);
        assert_eq!(h.player.view().controls.opacity, 0.0);

        h.player.handle_input(InputEvent::PointerMove, 7100);
        assert_eq!(h.player.view().controls.opacity, 1.0);
    }

    #[test]
    fn test_open_menu_keeps_controls_visible() {
        let mut h = harness();
        h.action(UserAction::Play, 0);
        h.action(UserAction::ToggleSpeedMenu, 0);
        h.player.on_timer(3000);
        assert_eq!(h.player.view().controls.opacity, 1.0);
    }

    #[test]
    fn test_catcher_click_toggles_play() {
        let mut h = harness();
        let d = h.player.handle_input(
            InputEvent::PointerDown {
                x_percent: 50.0,
                y_percent: 50.0,
            },
            0,
        );
        assert_eq!(d, Disposition::Handled);
        assert_eq!(h.status(), PlaybackStatus::Playing);

        // Blocker over the title bar swallows the click
        h.player.handle_input(
            InputEvent::PointerDown {
                x_percent: 50.0,
                y_percent: 5.0,
            },
            10,
        );
        assert_eq!(h.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_rates_outside_allowed_set_rejected() {
        let mut h = harness();
        h.action(UserAction::SetRate { rate: 3.0 }, 0);
        assert!(h.sink.messages().is_empty());
        h.action(UserAction::SetRate { rate: 1.5 }, 10);
        assert_eq!(h.sink.funcs(), vec!["setPlaybackRate"]);
        assert_eq!(h.player.store().state().playback_rate, 1.5);
    }

    #[test]
    fn test_volume_and_mute() {
        let mut h = harness();
        h.action(UserAction::AdjustVolume { delta: 5 }, 0);
        assert!(h.sink.messages().is_empty(), "Already at 100");
        h.action(UserAction::AdjustVolume { delta: -30 }, 10);
        assert_eq!(h.player.store().state().volume, 70);
        h.action(UserAction::ToggleMute, 20);
        h.action(UserAction::ToggleMute, 30);
        assert_eq!(h.sink.funcs(), vec!["setVolume", "mute", "unMute"]);
    }

    #[test]
    fn test_minimal_skin_ignores_volume() {
        let config = PlayerConfig {
            skin: SkinKind::Minimal,
            ..PlayerConfig::default()
        };
        let mut h = harness_with(config, None);
        h.action(UserAction::ToggleMute, 0);
        h.action(UserAction::SetRate { rate: 2.0 }, 0);
        assert!(h.sink.messages().is_empty());
    }

    #[test]
    fn test_share_reports_source() {
        let config = PlayerConfig {
            skin: SkinKind::Share,
            ..PlayerConfig::default()
        };
        let mut h = harness_with(config, None);
        h.action(UserAction::Share, 0);
        assert_eq!(
            h.host.events(),
            vec![HostEvent::Share {
                video_id: "dQw4w9WgXcQ".to_string()
            }]
        );
    }

    #[test]
    fn test_guard_runs_first() {
        let mut h = harness();
        assert_eq!(
            h.player.handle_input(InputEvent::ContextMenu, 0),
            Disposition::Suppressed
        );
        assert_eq!(
            h.player.handle_input(InputEvent::Copy, 0),
            Disposition::Suppressed
        );
    }

    #[test]
    fn test_fullscreen_reconciled() {
        let mut h = harness();
        h.action(UserAction::ToggleFullscreen, 0);
        assert!(h.player.store().state().is_fullscreen);
        h.player
            .handle_input(InputEvent::FullscreenChanged { active: false }, 10);
        assert!(!h.player.store().state().is_fullscreen);
    }

    #[test]
    fn test_watermark_carries_masked_identity() {
        let mut h = harness();
        let view = h.player.view();
        assert_eq!(view.watermark.text, "jo***@example.com");
        assert_eq!(view.watermark.generation, 1);

        let deadline = h.player.compositor().watermark().next_deadline();
        h.player.on_timer(deadline);
        assert_eq!(h.player.view().watermark.generation, 2);
        // Identity text never crosses the boundary
        assert!(h
            .sink
            .messages()
            .iter()
            .all(|m| !m.to_json().unwrap().contains("jo***")));
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut h = harness();
        h.player.teardown();
        h.player.poll_sync(0);
        h.action(UserAction::Play, 0);
        assert!(h.player.handle_inbound(ORIGIN, &json!({"event": "onStateChange", "info": 1}), 0).is_none());
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.status(), PlaybackStatus::Unstarted);
    }
}
