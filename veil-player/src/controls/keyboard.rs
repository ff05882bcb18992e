//! Keyboard shortcuts
//!
//! Bound at the page level, so the controller must skip them whenever focus
//! is in a text field. Keys held with Ctrl/Cmd are left to the browser (the
//! anti-piracy guard handles the few it blocks).

use veil_common::config::ControlsConfig;

use crate::input::{KeyInput, UserAction};

/// Map a key press to a control action
///
/// Returns `None` for unbound keys, modified keys and keys typed into a text
/// input.
pub fn map_key(input: &KeyInput, controls: &ControlsConfig) -> Option<UserAction> {
    if input.focus == crate::input::FocusTarget::TextInput || input.has_command_modifier() {
        return None;
    }

    let step = controls.seek_step_seconds;
    let long_step = controls.long_seek_step_seconds;
    let volume_step = i16::from(controls.volume_step);

    let action = match input.key.as_str() {
        " " | "Spacebar" | "k" | "K" => UserAction::TogglePlay,
        "ArrowLeft" => UserAction::SeekBy { seconds: -step },
        "ArrowRight" => UserAction::SeekBy { seconds: step },
        "j" | "J" => UserAction::SeekBy { seconds: -long_step },
        "l" | "L" => UserAction::SeekBy { seconds: long_step },
        "ArrowUp" => UserAction::AdjustVolume { delta: volume_step },
        "ArrowDown" => UserAction::AdjustVolume { delta: -volume_step },
        "m" | "M" => UserAction::ToggleMute,
        "f" | "F" => UserAction::ToggleFullscreen,
        "Escape" | "Esc" => UserAction::CloseMenus,
        key => {
            let digit = single_digit(key)?;
            UserAction::SeekToFraction {
                fraction: f64::from(digit) / 10.0,
            }
        }
    };
    Some(action)
}

fn single_digit(key: &str) -> Option<u32> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    c.to_digit(10)
}
