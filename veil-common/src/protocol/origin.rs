//! Origin filtering for inbound messages

/// Set of origins whose messages are accepted
///
/// Comparison is case-insensitive on the scheme and host and ignores a
/// trailing slash. An empty policy rejects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Build a policy from configured origins
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|o| normalize(o.as_ref()))
            .filter(|o| !o.is_empty())
            .collect();
        Self { allowed }
    }

    /// Whether a message from `origin` may be processed
    pub fn accepts(&self, origin: &str) -> bool {
        let origin = normalize(origin);
        !origin.is_empty() && self.allowed.iter().any(|a| *a == origin)
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
