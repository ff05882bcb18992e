//! Playable source references
//!
//! A source is validated before any channel to the widget is opened: an
//! unusable reference produces the static placeholder and no commands.

use serde::Serialize;
use veil_common::{Error, Result};

/// Length of a platform video id
const VIDEO_ID_LEN: usize = 11;

/// URL path segments that precede a video id
const PATH_MARKERS: [&str; 4] = ["/embed/", "/shorts/", "/live/", "/v/"];

/// Validated reference to one playable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    video_id: String,
    /// Reference exactly as supplied by the host
    original: String,
}

impl SourceRef {
    /// Accept a bare video id or a URL carrying one
    ///
    /// # Examples
    ///
    /// ```
    /// use veil_player::source::SourceRef;
    ///
    /// let s = SourceRef::parse("https://youtu.be/dQw4w9WgXcQ?t=10").unwrap();
    /// assert_eq!(s.video_id(), "dQw4w9WgXcQ");
    /// ```
    pub fn parse(reference: &str) -> Result<Self> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSource("empty source reference".to_string()));
        }

        let video_id = if is_video_id(trimmed) {
            trimmed.to_string()
        } else {
            extract_from_url(trimmed).ok_or_else(|| {
                Error::InvalidSource(format!("no video id in '{}'", trimmed))
            })?
        };

        Ok(Self {
            video_id,
            original: trimmed.to_string(),
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn original(&self) -> &str {
        &self.original
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.video_id)
    }
}

/// Item to chain after the current one ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSource {
    pub source: SourceRef,
    /// Human-readable label shown on the end screen
    pub label: String,
}

impl NextSource {
    pub fn parse(reference: &str, label: impl Into<String>) -> Result<Self> {
        let source = SourceRef::parse(reference)?;
        let label = label.into();
        let label = if label.trim().is_empty() {
            "Next video".to_string()
        } else {
            label.trim().to_string()
        };
        Ok(Self { source, label })
    }
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Take the id-shaped prefix of `rest`, if any
fn leading_id(rest: &str) -> Option<String> {
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let candidate = &rest[..end];
    is_video_id(candidate).then(|| candidate.to_string())
}

fn extract_from_url(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")) {
        return None;
    }

    // watch?v=<id> anywhere in the query string
    if let Some(query_start) = url.find('?') {
        for pair in url[query_start + 1..].split(['&', '#']) {
            if let Some(value) = pair.strip_prefix("v=") {
                if let Some(id) = leading_id(value) {
                    return Some(id);
                }
            }
        }
    }

    // youtu.be/<id>
    if let Some(pos) = lower.find("youtu.be/") {
        if let Some(id) = leading_id(&url[pos + "youtu.be/".len()..]) {
            return Some(id);
        }
    }

    for marker in PATH_MARKERS {
        if let Some(pos) = lower.find(marker) {
            if let Some(id) = leading_id(&url[pos + marker.len()..]) {
                return Some(id);
            }
        }
    }

    None
}
