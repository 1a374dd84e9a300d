//! Codec configuration.

use serde::{Deserialize, Serialize};

/// Tuning for the budgeted compression loop and input validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest acceptable encoded asset, in bytes.
    pub max_bytes: usize,
    /// Encoder invocations before giving up.
    pub max_attempts: u32,
    /// Quality of the first attempt (1-100).
    pub initial_quality: u8,
    /// Quality decrease per attempt.
    pub quality_step: u8,
    /// Quality floor; the ladder never goes below it.
    pub min_quality: u8,
    /// Smallest accepted source side, in pixels.
    pub min_dimension: u32,
    /// Largest accepted source side, in pixels.
    pub max_dimension: u32,
    /// Allowed relative difference between source and target aspect ratio.
    pub aspect_tolerance: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_bytes: 120_000,
            max_attempts: 9,
            initial_quality: 90,
            quality_step: 10,
            min_quality: 10,
            min_dimension: 16,
            max_dimension: 4096,
            aspect_tolerance: 0.25,
        }
    }
}

impl CodecConfig {
    /// The quality values the compression loop will try, in order.
    pub fn quality_ladder(&self) -> Vec<u8> {
        let floor = self.min_quality.clamp(1, 100);
        let mut q = self.initial_quality.clamp(floor, 100);
        let mut ladder = Vec::new();
        for _ in 0..self.max_attempts {
            ladder.push(q);
            if q == floor {
                break;
            }
            q = q.saturating_sub(self.quality_step.max(1)).max(floor);
        }
        ladder
    }
}
