use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::{
    enumerator::Enumerator,
    filters::{MedianFilter, RangeFilter},
    statistics::{ReleasedStatistics, SubgroupStatistics},
    subgroup::{SubgroupAssigner, SubgroupConstraint},
    traits::{CandidateFilter, Result, StageReport},
};
use crate::{
    config::EngineConfig,
    records::{Age, Attribute, CandidateSet},
};

/// Drives one reconstruction: enumerate once, then narrow the candidate set
/// stage by stage as statistics are released.
///
/// The set is owned here and handed to each stage by `&mut`, one stage at a
/// time. Every stage is logged along with a bounded preview.
#[derive(Debug)]
pub struct Reconstruction {
    config: EngineConfig,
    candidates: CandidateSet,
    reports: Vec<(String, StageReport)>,

    /// Shared by every subgroup stage so that filler labels differ between
    /// attributes but stay reproducible for a given seed.
    rng: ChaCha20Rng,
}

impl Reconstruction {
    /// Enumerates the datasets of `count` records with the given average,
    /// within `[min, max]`.
    pub fn from_average(
        config: EngineConfig,
        count: usize,
        average: f64,
        min: Age,
        max: Age,
    ) -> Result<Self> {
        let sum = super::statistics::age_sum(count, average)?;
        info!(
            "Reconstructing {count} records with average age {average} (sum {sum}), assuming ages in [{min}, {max}]"
        );

        let candidates = Enumerator::new(&config).enumerate(sum, count, min, max)?;
        let rng = ChaCha20Rng::seed_from_u64(config.filler_seed);
        let mut this = Self {
            config,
            candidates,
            reports: vec![],
            rng,
        };
        let report = StageReport::new(this.candidates.len(), this.candidates.len());
        this.record("count and average", report);
        Ok(this)
    }

    /// Runs every released statistic in the fixed order: count and average,
    /// range, median, then gender, condition and blood type subgroups.
    pub fn run(config: EngineConfig, stats: &ReleasedStatistics) -> Result<Self> {
        // Start from the assumed bounds, widened if the released range
        // falls outside them.
        let (mut min, mut max) = (config.default_min_age, config.default_max_age);
        if let Some((lo, hi)) = stats.range {
            min = min.min(lo);
            max = max.max(hi);
        }

        let mut this = Self::from_average(config, stats.count, stats.average, min, max)?;
        if let Some((lo, hi)) = stats.range {
            this.restrict_range(lo, hi)?;
        }
        if let Some(median) = stats.median {
            this.restrict_median(median)?;
        }

        let mut subgroups: Vec<&SubgroupStatistics> = stats.subgroups.iter().collect();
        subgroups.sort_by_key(|s| stage_order(s.attribute));
        for subgroup in subgroups {
            this.assign_subgroup(
                subgroup.attribute,
                &subgroup.label,
                subgroup.count,
                subgroup.average,
            )?;
        }
        Ok(this)
    }

    pub fn restrict_range(&mut self, min: Age, max: Age) -> Result<StageReport> {
        let mut filter = RangeFilter::new(min, max)?;
        self.apply("age range", &mut filter)
    }

    pub fn restrict_median(&mut self, median: f64) -> Result<StageReport> {
        let mut filter = MedianFilter::new(median, self.config.median_tolerance)?;
        self.apply("median age", &mut filter)
    }

    pub fn assign_subgroup(
        &mut self,
        attribute: Attribute,
        label: &str,
        size: usize,
        average: f64,
    ) -> Result<StageReport> {
        let constraint = SubgroupConstraint::new(attribute, label, size, average)?;
        let mut assigner = SubgroupAssigner::new(
            constraint,
            &mut self.rng,
            self.config.max_search_steps,
        );
        let report = assigner.apply(&mut self.candidates)?;
        self.record(&format!("{attribute} statistics"), report.clone());
        Ok(report)
    }

    /// Applies an arbitrary stage.
    pub fn apply(
        &mut self,
        stage: &str,
        filter: &mut dyn CandidateFilter,
    ) -> Result<StageReport> {
        debug!("Applying {stage}: {filter:?}");
        let report = filter.apply(&mut self.candidates)?;
        self.record(stage, report.clone());
        Ok(report)
    }

    fn record(&mut self, stage: &str, report: StageReport) {
        info!(
            "Number of possible records after filtering by {stage}: {}",
            report.after
        );
        if report.is_infeasible() {
            warn!("No candidate dataset is consistent with the statistics released so far");
        } else {
            if report.is_unique() {
                info!("Full reconstruction: a single dataset fits the statistics released so far");
            }
            debug!("{}", self.candidates.preview(self.config.preview_len));
        }
        self.reports.push((stage.to_string(), report));
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn into_candidates(self) -> CandidateSet {
        self.candidates
    }

    /// Stage names and reports, in the order the stages ran.
    pub fn reports(&self) -> &[(String, StageReport)] {
        &self.reports
    }

    pub fn preview(&self) -> String {
        self.candidates.preview(self.config.preview_len)
    }
}

fn stage_order(attribute: Attribute) -> u8 {
    match attribute {
        Attribute::Gender => 0,
        Attribute::Condition => 1,
        Attribute::BloodType => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_recorded() -> anyhow::Result<()> {
        let mut recon =
            Reconstruction::from_average(EngineConfig::mock(), 4, 5.0, 0, 10)?;
        let total = recon.candidates().len();
        recon.restrict_range(2, 8)?;
        recon.restrict_median(5.0)?;
        recon.assign_subgroup(Attribute::Gender, "Male", 2, 4.0)?;

        let stages: Vec<&str> =
            recon.reports().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                "count and average",
                "age range",
                "median age",
                "Gender statistics"
            ]
        );
        assert_eq!(recon.reports()[0].1.after, total);
        let mut previous = total;
        for (_, report) in recon.reports() {
            assert!(report.after <= previous);
            previous = report.after;
        }
        Ok(())
    }

    #[test]
    fn test_subgroups_run_in_fixed_order() -> anyhow::Result<()> {
        let mut stats = ReleasedStatistics::new(3, 10.0);
        stats.subgroups = vec![
            SubgroupStatistics {
                attribute: Attribute::BloodType,
                label: "A+".to_string(),
                count: 1,
                average: 10.0,
            },
            SubgroupStatistics {
                attribute: Attribute::Gender,
                label: "Female".to_string(),
                count: 1,
                average: 10.0,
            },
        ];

        let recon = Reconstruction::run(EngineConfig::mock(), &stats)?;
        let stages: Vec<&str> =
            recon.reports().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            stages,
            vec!["count and average", "Gender statistics", "Blood Type statistics"]
        );
        Ok(())
    }

    #[test]
    fn test_range_beyond_defaults_widens_enumeration() -> anyhow::Result<()> {
        let mut stats = ReleasedStatistics::new(2, 102.0);
        stats.range = Some((101, 103));
        let recon = Reconstruction::run(EngineConfig::mock(), &stats)?;
        let ages: Vec<Vec<Age>> =
            recon.candidates().iter().map(|c| c.ages()).collect();
        assert_eq!(ages, vec![vec![101, 103], vec![102, 102]]);
        Ok(())
    }
}
