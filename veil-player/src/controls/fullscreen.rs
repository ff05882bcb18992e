//! Fullscreen toggling
//!
//! The local `is_fullscreen` flag is only a belief. The platform can leave
//! fullscreen on its own (Escape, OS gestures), so its change notification
//! always overrides the flag.

use tracing::{info, warn};
use veil_common::Result;

use crate::state::PlaybackStore;

/// Platform fullscreen primitives (`requestFullscreen` / `exitFullscreen`)
pub trait FullscreenPlatform: Send {
    fn request(&mut self) -> Result<()>;
    fn exit(&mut self) -> Result<()>;
}

/// Platform where the host performs the transition itself
///
/// Requests always succeed; the host reports the outcome through its
/// change notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostManagedFullscreen;

impl FullscreenPlatform for HostManagedFullscreen {
    fn request(&mut self) -> Result<()> {
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Flip fullscreen; on rejection the flag is left unchanged
pub fn toggle(platform: &mut dyn FullscreenPlatform, store: &mut PlaybackStore) {
    let want = !store.state().is_fullscreen;
    let result = if want { platform.request() } else { platform.exit() };
    match result {
        Ok(()) => store.set_fullscreen(want),
        Err(e) => warn!("Fullscreen {} rejected: {}", if want { "request" } else { "exit" }, e),
    }
}

/// Apply the platform's change notification
pub fn reconcile(store: &mut PlaybackStore, active: bool) {
    if store.state().is_fullscreen != active {
        info!("Fullscreen flag reconciled to {}", active);
        store.set_fullscreen(active);
    }
}
