//! Inbound event parsing
//!
//! The message stream we receive is shared with every other frame on the
//! page, so most of what arrives is not ours. Parsing never fails loudly:
//! the result is `Some(event)` for a recognized message and `None` for
//! everything else.

use serde_json::Value;

/// Widget-reported player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    /// `-1`: loaded, never started
    Unstarted,
    /// `0`: reached the end
    Ended,
    /// `1`
    Playing,
    /// `2`
    Paused,
    /// `3`
    Buffering,
    /// `5`: item cued but not started
    Cued,
}

impl WidgetState {
    /// Map the widget's integer code; unknown codes yield `None`
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(WidgetState::Unstarted),
            0 => Some(WidgetState::Ended),
            1 => Some(WidgetState::Playing),
            2 => Some(WidgetState::Paused),
            3 => Some(WidgetState::Buffering),
            5 => Some(WidgetState::Cued),
            _ => None,
        }
    }
}

/// Periodic info snapshot (`infoDelivery`)
///
/// Every field is optional: widgets send partial deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoSnapshot {
    /// Playback position in seconds
    pub current_time: Option<f64>,
    /// Item duration in seconds
    pub duration: Option<f64>,
    /// Fraction of the item already buffered (0.0-1.0)
    pub loaded_fraction: Option<f64>,
    /// Player state as of the snapshot (poll-derived)
    pub player_state: Option<WidgetState>,
    /// Volume on the 0-100 scale
    pub volume: Option<f64>,
    /// Mute flag
    pub muted: Option<bool>,
    /// Playback rate multiplier
    pub playback_rate: Option<f64>,
}

impl InfoSnapshot {
    /// True when the snapshot carries no usable field
    pub fn is_empty(&self) -> bool {
        *self == InfoSnapshot::default()
    }
}

/// Recognized inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `onStateChange` push notification
    StateChange(WidgetState),
    /// `infoDelivery` snapshot
    InfoDelivery(InfoSnapshot),
    /// `listening` handshake acknowledgement
    Listening,
    /// `onReady`
    Ready,
    /// `onError` with the widget's error code
    Error {
        /// Widget error code (2, 5, 100, 101, 150 ...)
        code: i64,
    },
}

/// Parse message data delivered as JSON text
pub fn parse_inbound_text(text: &str) -> Option<InboundEvent> {
    let value: Value = serde_json::from_str(text).ok()?;
    parse_inbound(&value)
}

/// Parse message data delivered as a structured value
///
/// A string value is treated as JSON text (widgets post either form).
pub fn parse_inbound(value: &Value) -> Option<InboundEvent> {
    if let Value::String(text) = value {
        return parse_inbound_text(text);
    }

    let obj = value.as_object()?;
    let event = obj.get("event")?.as_str()?;
    let info = obj.get("info").unwrap_or(&Value::Null);

    match event {
        "onStateChange" => {
            let code = integer(info)?;
            WidgetState::from_code(code).map(InboundEvent::StateChange)
        }
        "infoDelivery" => {
            let snapshot = parse_snapshot(info)?;
            if snapshot.is_empty() {
                None
            } else {
                Some(InboundEvent::InfoDelivery(snapshot))
            }
        }
        "listening" => Some(InboundEvent::Listening),
        "onReady" => Some(InboundEvent::Ready),
        "onError" => integer(info).map(|code| InboundEvent::Error { code }),
        _ => None,
    }
}

fn parse_snapshot(info: &Value) -> Option<InfoSnapshot> {
    let obj = info.as_object()?;

    Some(InfoSnapshot {
        current_time: obj.get("currentTime").and_then(non_negative),
        duration: obj.get("duration").and_then(non_negative),
        loaded_fraction: obj
            .get("videoLoadedFraction")
            .and_then(non_negative)
            .map(|f| f.min(1.0)),
        player_state: obj
            .get("playerState")
            .and_then(integer)
            .and_then(WidgetState::from_code),
        volume: obj.get("volume").and_then(non_negative),
        muted: obj.get("muted").and_then(Value::as_bool),
        playback_rate: obj
            .get("playbackRate")
            .and_then(non_negative)
            .filter(|r| *r > 0.0),
    })
}

/// Integer or integral float; anything else is rejected
fn integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

fn non_negative(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite() && *f >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_change_codes() {
        let cases = [
            (-1, WidgetState::Unstarted),
            (0, WidgetState::Ended),
            (1, WidgetState::Playing),
            (2, WidgetState::Paused),
            (3, WidgetState::Buffering),
            (5, WidgetState::Cued),
        ];
        for (code, expected) in cases {
            let msg = json!({"event": "onStateChange", "info": code});
            assert_eq!(parse_inbound(&msg), Some(InboundEvent::StateChange(expected)));
        }
    }

    #[test]
    fn test_unknown_state_code_dropped() {
        let msg = json!({"event": "onStateChange", "info": 4});
        assert_eq!(parse_inbound(&msg), None);
    }

    #[test]
    fn test_state_change_from_text() {
        let event = parse_inbound_text(r#"{"event":"onStateChange","info":2}"#);
        assert_eq!(event, Some(InboundEvent::StateChange(WidgetState::Paused)));
    }

    #[test]
    fn test_string_value_is_reparsed() {
        let msg = Value::String(r#"{"event":"onReady"}"#.to_string());
        assert_eq!(parse_inbound(&msg), Some(InboundEvent::Ready));
    }

    #[test]
    fn test_info_delivery_fields() {
        let msg = json!({
            "event": "infoDelivery",
            "info": {
                "currentTime": 12.5,
                "duration": 300,
                "videoLoadedFraction": 0.25,
                "playerState": 1,
                "volume": 80,
                "muted": false,
                "playbackRate": 1.5
            }
        });
        let Some(InboundEvent::InfoDelivery(snap)) = parse_inbound(&msg) else {
            panic!("Expected info delivery");
        };
        assert_eq!(snap.current_time, Some(12.5));
        assert_eq!(snap.duration, Some(300.0));
        assert_eq!(snap.loaded_fraction, Some(0.25));
        assert_eq!(snap.player_state, Some(WidgetState::Playing));
        assert_eq!(snap.volume, Some(80.0));
        assert_eq!(snap.muted, Some(false));
        assert_eq!(snap.playback_rate, Some(1.5));
    }

    #[test]
    fn test_info_delivery_partial_and_bad_fields() {
        let msg = json!({
            "event": "infoDelivery",
            "info": {"currentTime": "soon", "duration": -5, "videoLoadedFraction": 3.0}
        });
        let Some(InboundEvent::InfoDelivery(snap)) = parse_inbound(&msg) else {
            panic!("Expected info delivery");
        };
        assert_eq!(snap.current_time, None);
        assert_eq!(snap.duration, None);
        assert_eq!(snap.loaded_fraction, Some(1.0));
    }

    #[test]
    fn test_empty_info_delivery_dropped() {
        let msg = json!({"event": "infoDelivery", "info": {"unrelated": 1}});
        assert_eq!(parse_inbound(&msg), None);
    }

    #[test]
    fn test_foreign_and_malformed_messages() {
        assert_eq!(parse_inbound_text("not json"), None);
        assert_eq!(parse_inbound_text("[1,2,3]"), None);
        assert_eq!(parse_inbound(&json!({"type": "webpackOk"})), None);
        assert_eq!(parse_inbound(&json!({"event": 7})), None);
        assert_eq!(parse_inbound(&json!({"event": "onStateChange"})), None);
        assert_eq!(parse_inbound(&json!({"event": "onStateChange", "info": 1.5})), None);
        assert_eq!(parse_inbound(&json!({"event": "somethingElse", "info": {}})), None);
    }

    #[test]
    fn test_error_event() {
        let msg = json!({"event": "onError", "info": 150});
        assert_eq!(parse_inbound(&msg), Some(InboundEvent::Error { code: 150 }));
    }

    #[test]
    fn test_listening_acknowledgement() {
        let msg = json!({"event": "listening", "id": "abc"});
        assert_eq!(parse_inbound(&msg), Some(InboundEvent::Listening));
    }
}
