//! Viewer identity for watermark text
//!
//! The raw id/email arrives from the host's profile collaborator. Only the
//! masked fragment is kept, and it is only ever rendered into watermark
//! marks. It never reaches the command channel.

use serde::Serialize;

/// Masked viewer identifier, computed once per mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    masked: String,
}

impl SessionIdentity {
    /// Mask an email (`jo***@example.com`) or bare id (`***1234`)
    pub fn from_viewer(raw: Option<&str>) -> Self {
        let raw = raw.map(str::trim).unwrap_or_default();
        let masked = if raw.is_empty() {
            "viewer".to_string()
        } else if let Some((local, domain)) = raw.split_once('@') {
            let prefix: String = local.chars().take(2).collect();
            format!("{}***@{}", prefix, domain)
        } else {
            let chars: Vec<char> = raw.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("***{}", tail)
        };
        Self { masked }
    }

    /// Text rendered into every watermark mark
    pub fn watermark_text(&self) -> &str {
        &self.masked
    }
}
