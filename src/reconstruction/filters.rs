use log::debug;

use super::traits::{CandidateFilter, ReconstructionError, Result, StageReport};
use crate::{
    config::EngineConfig,
    records::{Age, CandidateSet},
};

/// Removes every candidate with an age outside `[min, max]`.
pub fn filter_by_range(
    candidates: &mut CandidateSet,
    min: Age,
    max: Age,
) -> Result<StageReport> {
    RangeFilter::new(min, max)?.apply(candidates)
}

/// Keeps the candidates whose median age matches `median`, within the
/// default tolerance.
pub fn filter_by_median(
    candidates: &mut CandidateSet,
    median: f64,
) -> Result<StageReport> {
    MedianFilter::new(median, EngineConfig::default().median_tolerance)?
        .apply(candidates)
}

/// Released age range. Used once the real range is known, to tighten the
/// looser bounds the enumeration started from.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    pub min: Age,
    pub max: Age,
}

impl RangeFilter {
    pub fn new(min: Age, max: Age) -> Result<Self> {
        if min > max {
            return Err(ReconstructionError::InvalidConstraint(format!(
                "minimum age {min} is greater than maximum age {max}"
            )));
        }
        Ok(Self { min, max })
    }
}

impl CandidateFilter for RangeFilter {
    fn apply(&mut self, candidates: &mut CandidateSet) -> Result<StageReport> {
        let before = candidates.len();
        let range = self.min..=self.max;
        candidates.retain(|c| c.records.iter().all(|r| range.contains(&r.age)));

        debug!(
            "Range [{}, {}] kept {} of {before} candidates",
            self.min,
            self.max,
            candidates.len()
        );
        Ok(StageReport::new(before, candidates.len()))
    }
}

/// Released median age.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    pub median: f64,
    pub tolerance: f64,
}

impl MedianFilter {
    pub fn new(median: f64, tolerance: f64) -> Result<Self> {
        if !median.is_finite() {
            return Err(ReconstructionError::InvalidConstraint(format!(
                "median {median} is not a finite number"
            )));
        }
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(ReconstructionError::InvalidConstraint(format!(
                "median tolerance {tolerance} must be non-negative"
            )));
        }
        Ok(Self { median, tolerance })
    }
}

impl CandidateFilter for MedianFilter {
    fn apply(&mut self, candidates: &mut CandidateSet) -> Result<StageReport> {
        let before = candidates.len();
        candidates.retain(|c| match c.median_age() {
            Some(m) => (m - self.median).abs() <= self.tolerance,
            None => false,
        });

        debug!(
            "Median {} (+/- {}) kept {} of {before} candidates",
            self.median,
            self.tolerance,
            candidates.len()
        );
        Ok(StageReport::new(before, candidates.len()))
    }
}
