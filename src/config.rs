use serde::{Deserialize, Serialize};

use crate::records::Age;

/// Knobs for one reconstruction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lower age bound assumed before the real range is released.
    pub default_min_age: Age,

    /// Upper age bound assumed before the real range is released.
    pub default_max_age: Age,

    /// Absolute tolerance when comparing a candidate median with the
    /// released one. Medians of integer ages are multiples of 0.5, so any
    /// value below 0.25 only absorbs float noise in the released statistic.
    pub median_tolerance: f64,

    /// Maximum number of sequences the partition table may materialize.
    pub max_sequences: usize,

    /// Maximum number of recursive steps of one subset-sum search.
    pub max_search_steps: usize,

    /// Number of candidates rendered after each stage.
    pub preview_len: usize,

    /// Seed of the generator drawing non-evidentiary filler labels.
    pub filler_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_min_age: 0,
            default_max_age: 100,
            median_tolerance: 1e-6,
            max_sequences: 5_000_000,
            max_search_steps: 10_000_000,
            preview_len: 3,
            filler_seed: 0,
        }
    }
}
