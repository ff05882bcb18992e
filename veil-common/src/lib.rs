//! # Veil Common Library
//!
//! Shared code for the Veil embedded-player crates including:
//! - Cross-boundary protocol (outbound commands, inbound widget events)
//! - Origin filtering for inbound messages
//! - Configuration loading (TOML bootstrap + compiled defaults)
//! - Common error type

pub mod config;
pub mod error;
pub mod protocol;

pub use config::PlayerConfig;
pub use error::{Error, Result};
