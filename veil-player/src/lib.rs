//! # Veil Player (veil-player)
//!
//! Control layer for an embedded third-party video widget.
//!
//! **Purpose:** Drive a widget this crate does not own through its
//! cross-frame messaging protocol, keep a local model of its playback
//! state, and present custom controls, branding blockers, viewer
//! watermarks and an end screen over it.
//!
//! **Architecture:** Headless core. The host feeds widget messages and
//! DOM-derived input into a [`session`] task and renders the published
//! [`view::PlayerView`]. Wire types and configuration live in
//! `veil-common`.

pub mod channel;
pub mod controller;
pub mod controls;
pub mod guard;
pub mod host;
pub mod identity;
pub mod input;
pub mod listener;
pub mod overlay;
pub mod poller;
pub mod session;
pub mod source;
pub mod state;
pub mod time;
pub mod view;

pub use controller::{ControllerSetup, PlayerController, PlayerIo};
pub use session::{mount, Mount, MountOptions, SessionHandle};
pub use state::{PlaybackState, PlaybackStatus};
pub use veil_common::{Error, Result};
