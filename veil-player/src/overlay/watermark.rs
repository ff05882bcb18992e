//! Watermark layout
//!
//! Marks carrying the masked viewer identity float over the video. Count,
//! position and opacity are re-randomized on a jittered period so a fixed
//! crop or blur mask cannot remove them. Layouts live only in memory.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::debug;
use veil_common::config::{TimingConfig, WatermarkConfig};

use crate::time::Millis;

/// One mark, positioned in percent of the player box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatermarkMark {
    pub vertical_percent: f64,
    pub horizontal_percent: f64,
    pub opacity: f64,
}

/// Generate a fresh set of marks
///
/// The vertical range is split into one band per mark so marks do not
/// stack on top of each other. Marks are ordered top to bottom.
pub fn generate_layout<R: Rng>(config: &WatermarkConfig, rng: &mut R) -> Vec<WatermarkMark> {
    let count = rng.gen_range(config.min_count..=config.max_count);
    let span = config.vertical_max_percent - config.vertical_min_percent;
    let band = span / count as f64;

    (0..count)
        .map(|i| {
            let lo = config.vertical_min_percent + band * i as f64;
            let hi = (lo + band).min(config.vertical_max_percent);
            WatermarkMark {
                vertical_percent: rng.gen_range(lo..=hi),
                horizontal_percent: rng
                    .gen_range(config.horizontal_min_percent..=config.horizontal_max_percent),
                opacity: rng.gen_range(config.opacity_min..=config.opacity_max),
            }
        })
        .collect()
}

/// Jittered delay until the next regeneration
pub fn next_interval<R: Rng>(timing: &TimingConfig, rng: &mut R) -> Millis {
    rng.gen_range(timing.watermark_min_interval_ms..=timing.watermark_max_interval_ms)
}

/// Owns the current layout and its regeneration deadline
pub struct WatermarkScheduler {
    config: WatermarkConfig,
    timing: TimingConfig,
    rng: StdRng,
    marks: Vec<WatermarkMark>,
    generation: u64,
    next_regen_at: Millis,
}

impl WatermarkScheduler {
    /// Build the first layout at `now`
    pub fn new(config: WatermarkConfig, timing: TimingConfig, mut rng: StdRng, now: Millis) -> Self {
        let marks = generate_layout(&config, &mut rng);
        let next_regen_at = now + next_interval(&timing, &mut rng);
        Self {
            config,
            timing,
            rng,
            marks,
            generation: 1,
            next_regen_at,
        }
    }

    pub fn marks(&self) -> &[WatermarkMark] {
        &self.marks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_deadline(&self) -> Millis {
        self.next_regen_at
    }

    /// Regenerate if the deadline has passed; `true` when a new layout was made
    pub fn on_timer(&mut self, now: Millis) -> bool {
        if now < self.next_regen_at {
            return false;
        }
        self.marks = generate_layout(&self.config, &mut self.rng);
        self.generation += 1;
        self.next_regen_at = now + next_interval(&self.timing, &mut self.rng);
        debug!(
            "Watermark layout #{} ({} marks), next at {}ms",
            self.generation,
            self.marks.len(),
            self.next_regen_at
        );
        true
    }
}
