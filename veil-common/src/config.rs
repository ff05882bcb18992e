//! Configuration loading
//!
//! Player behavior is configured by a single TOML file. Every setting has a
//! compiled default, so a missing file (or a missing section) is never fatal.
//!
//! # Config File Resolution
//!
//! 1. Command-line argument (highest priority)
//! 2. `VEIL_CONFIG` environment variable
//! 3. `<config dir>/veil/config.toml` (per-platform, via `dirs`)
//! 4. Compiled defaults (fallback)
//!
//! Branding-blocker geometry lives here on purpose: it is tied to the
//! embedded widget's own chrome layout, which changes without notice.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "VEIL_CONFIG";

/// Complete player configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Timer periods
    pub timing: TimingConfig,

    /// Watermark regeneration bounds
    pub watermark: WatermarkConfig,

    /// Keyboard/seek step sizes
    pub controls: ControlsConfig,

    /// Opaque rectangles covering the widget's native chrome
    pub blockers: Vec<BlockerRect>,

    /// Selectable playback rates, ascending
    pub playback_rates: Vec<f64>,

    /// Origins whose inbound messages are processed
    pub allowed_origins: Vec<String>,

    /// Control surface variant
    pub skin: SkinKind,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Timer periods (milliseconds)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Sync Poller period
    pub sync_interval_ms: u64,
    /// Inactivity window before the control surface hides
    pub hide_controls_after_ms: u64,
    /// Touch hold duration that counts as a long press
    pub long_press_ms: u64,
    /// Shortest watermark regeneration period
    pub watermark_min_interval_ms: u64,
    /// Longest watermark regeneration period
    pub watermark_max_interval_ms: u64,
}

/// Watermark layout bounds
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Fewest marks per layout
    pub min_count: usize,
    /// Most marks per layout
    pub max_count: usize,
    /// Vertical position range (percent of height)
    pub vertical_min_percent: f64,
    pub vertical_max_percent: f64,
    /// Horizontal position range (percent of width)
    pub horizontal_min_percent: f64,
    pub horizontal_max_percent: f64,
    /// Opacity range (0.0-1.0)
    pub opacity_min: f64,
    pub opacity_max: f64,
}

/// Step sizes for keyboard and button actions
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Arrow-key seek step (seconds)
    pub seek_step_seconds: f64,
    /// J/L seek step (seconds)
    pub long_seek_step_seconds: f64,
    /// Arrow-key volume step (0-100 scale)
    pub volume_step: u8,
}

/// One branding blocker, in percent of the player box
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BlockerRect {
    /// Name used in logs and render output
    pub name: String,
    pub left_percent: f64,
    pub top_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
}

/// Control surface variant
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkinKind {
    /// Play/pause, seek bar, fullscreen
    Minimal,
    /// Minimal plus volume and speed menu
    #[default]
    Full,
    /// Full plus share button
    Share,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            watermark: WatermarkConfig::default(),
            controls: ControlsConfig::default(),
            blockers: default_blockers(),
            playback_rates: vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0],
            allowed_origins: vec![
                "https://www.youtube.com".to_string(),
                "https://www.youtube-nocookie.com".to_string(),
            ],
            skin: SkinKind::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 500,
            hide_controls_after_ms: 3000,
            long_press_ms: 500,
            watermark_min_interval_ms: 25_000,
            watermark_max_interval_ms: 40_000,
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            min_count: 3,
            max_count: 5,
            vertical_min_percent: 5.0,
            vertical_max_percent: 90.0,
            horizontal_min_percent: 5.0,
            horizontal_max_percent: 85.0,
            opacity_min: 0.08,
            opacity_max: 0.18,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            seek_step_seconds: 5.0,
            long_seek_step_seconds: 10.0,
            volume_step: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Blockers for the widget's title bar, channel logo and share strip
fn default_blockers() -> Vec<BlockerRect> {
    vec![
        BlockerRect {
            name: "title_bar".to_string(),
            left_percent: 0.0,
            top_percent: 0.0,
            width_percent: 100.0,
            height_percent: 12.0,
        },
        BlockerRect {
            name: "logo".to_string(),
            left_percent: 84.0,
            top_percent: 86.0,
            width_percent: 16.0,
            height_percent: 14.0,
        },
        BlockerRect {
            name: "share_strip".to_string(),
            left_percent: 88.0,
            top_percent: 12.0,
            width_percent: 12.0,
            height_percent: 20.0,
        },
    ]
}

impl TimingConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

impl PlayerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded player configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration following the resolution order in the module docs
    ///
    /// An explicitly named file (CLI or environment) must exist. The
    /// per-platform file is optional: when absent, defaults are used.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            return Self::load_from_path(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::load_from_path(Path::new(&path));
            }
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            Some(path) => {
                warn!(
                    "No config file at {}, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject settings the player cannot honor
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.sync_interval_ms == 0 {
            return Err(Error::Config("timing.sync_interval_ms must be > 0".to_string()));
        }
        if t.hide_controls_after_ms == 0 {
            return Err(Error::Config(
                "timing.hide_controls_after_ms must be > 0".to_string(),
            ));
        }
        if t.watermark_min_interval_ms == 0
            || t.watermark_min_interval_ms > t.watermark_max_interval_ms
        {
            return Err(Error::Config(format!(
                "invalid watermark interval range {}..={}ms",
                t.watermark_min_interval_ms, t.watermark_max_interval_ms
            )));
        }

        let w = &self.watermark;
        if w.min_count == 0 || w.min_count > w.max_count {
            return Err(Error::Config(format!(
                "invalid watermark count range {}..={}",
                w.min_count, w.max_count
            )));
        }
        check_percent_range("watermark vertical", w.vertical_min_percent, w.vertical_max_percent)?;
        check_percent_range(
            "watermark horizontal",
            w.horizontal_min_percent,
            w.horizontal_max_percent,
        )?;
        if !(0.0..=1.0).contains(&w.opacity_min)
            || !(0.0..=1.0).contains(&w.opacity_max)
            || w.opacity_min > w.opacity_max
        {
            return Err(Error::Config(format!(
                "invalid watermark opacity range {}..={}",
                w.opacity_min, w.opacity_max
            )));
        }

        for b in &self.blockers {
            let fits = b.left_percent >= 0.0
                && b.top_percent >= 0.0
                && b.width_percent > 0.0
                && b.height_percent > 0.0
                && b.left_percent + b.width_percent <= 100.0
                && b.top_percent + b.height_percent <= 100.0;
            if !fits {
                return Err(Error::Config(format!(
                    "blocker '{}' lies outside the player box",
                    b.name
                )));
            }
        }

        if self.playback_rates.is_empty() {
            return Err(Error::Config("playback_rates must not be empty".to_string()));
        }
        if self.playback_rates.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(Error::Config("playback_rates must be positive".to_string()));
        }
        if !self.playback_rates.iter().any(|r| (*r - 1.0).abs() < f64::EPSILON) {
            return Err(Error::Config("playback_rates must include 1.0".to_string()));
        }

        if self.controls.volume_step == 0 || self.controls.volume_step > 100 {
            return Err(Error::Config("controls.volume_step must be 1-100".to_string()));
        }

        Ok(())
    }
}

fn check_percent_range(what: &str, min: f64, max: f64) -> Result<()> {
    if (0.0..=100.0).contains(&min) && (0.0..=100.0).contains(&max) && min <= max {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid {} range {}..={}%", what, min, max)))
    }
}

/// Per-platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("veil").join("config.toml"))
}
