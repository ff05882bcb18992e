//! Control surface skins
//!
//! The player variants differ only in which controls they expose. A skin is
//! a capability set over the one shared control core.

use serde::Serialize;
use veil_common::config::SkinKind;

use crate::input::UserAction;

/// Controls a skin exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub volume: bool,
    pub speed_menu: bool,
    pub share: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    kind: SkinKind,
    capabilities: Capabilities,
}

impl Skin {
    pub fn new(kind: SkinKind) -> Self {
        let capabilities = match kind {
            SkinKind::Minimal => Capabilities {
                volume: false,
                speed_menu: false,
                share: false,
            },
            SkinKind::Full => Capabilities {
                volume: true,
                speed_menu: true,
                share: false,
            },
            SkinKind::Share => Capabilities {
                volume: true,
                speed_menu: true,
                share: true,
            },
        };
        Self { kind, capabilities }
    }

    pub fn kind(&self) -> SkinKind {
        self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether this skin offers the control behind `action`
    ///
    /// Play/pause, seeking, fullscreen and end-screen actions exist in every
    /// skin.
    pub fn allows(&self, action: &UserAction) -> bool {
        let caps = self.capabilities;
        match action {
            UserAction::SetVolume { .. }
            | UserAction::AdjustVolume { .. }
            | UserAction::ToggleMute => caps.volume,
            UserAction::SetRate { .. } | UserAction::ToggleSpeedMenu => caps.speed_menu,
            UserAction::Share => caps.share,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_skin_limits_controls() {
        let skin = Skin::new(SkinKind::Minimal);
        assert!(skin.allows(&UserAction::TogglePlay));
        assert!(skin.allows(&UserAction::SeekTo { seconds: 3.0 }));
        assert!(skin.allows(&UserAction::ToggleFullscreen));
        assert!(!skin.allows(&UserAction::ToggleMute));
        assert!(!skin.allows(&UserAction::SetRate { rate: 2.0 }));
        assert!(!skin.allows(&UserAction::Share));
    }

    #[test]
    fn test_full_skin_has_no_share() {
        let skin = Skin::new(SkinKind::Full);
        assert!(skin.allows(&UserAction::AdjustVolume { delta: 5 }));
        assert!(skin.allows(&UserAction::ToggleSpeedMenu));
        assert!(!skin.allows(&UserAction::Share));
    }

    #[test]
    fn test_share_skin_allows_everything() {
        let skin = Skin::new(SkinKind::Share);
        assert!(skin.allows(&UserAction::Share));
        assert!(skin.capabilities().volume);
    }
}
