//! Common error types for Veil

use thiserror::Error;

/// Common result type for Veil operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Veil crates
///
/// Nothing in the inbound message path produces one of these: malformed or
/// foreign widget messages are dropped, not reported.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or schema error in a configuration file
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding error on the outbound path
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or unrecognized playable source reference
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Platform refused a fullscreen request or exit
    #[error("Fullscreen rejected: {0}")]
    Fullscreen(String),

    /// Player session has already been torn down
    #[error("Session closed")]
    SessionClosed,
}
