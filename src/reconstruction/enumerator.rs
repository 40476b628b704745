use log::{debug, info};

use super::{partition_table::PartitionTable, traits::Result};
use crate::{
    config::EngineConfig,
    records::{Age, Candidate, CandidateSet},
};

/// Enumerates every candidate dataset of `count` records with ages in
/// `[min, max]` adding up to `target`, using the default budget.
pub fn enumerate(
    target: u32,
    count: usize,
    min: Age,
    max: Age,
) -> Result<CandidateSet> {
    Enumerator::new(&EngineConfig::default()).enumerate(target, count, min, max)
}

/// Builds the initial candidate set from a total, a count and age bounds.
#[derive(Debug, Clone)]
pub struct Enumerator {
    max_sequences: usize,
}

impl Enumerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_sequences: config.max_sequences,
        }
    }

    /// Candidates come out in canonical non-decreasing age order, so no two
    /// of them are permutations of each other. An unreachable target yields
    /// an empty set, not an error.
    pub fn enumerate(
        &self,
        target: u32,
        count: usize,
        min: Age,
        max: Age,
    ) -> Result<CandidateSet> {
        debug!(
            "Enumerating {count} ages in [{min}, {max}] summing to {target}"
        );

        let mut table = PartitionTable::new(min, max, self.max_sequences)?;
        table.fill(target, count)?;
        debug!(
            "Partition table solved {} subproblems, {} sequences stored",
            table.subproblems(),
            table.materialized()
        );

        let candidates: CandidateSet = table
            .take(target, count)
            .iter()
            .map(|ages| Candidate::from_ages(ages))
            .collect();

        info!("Enumerated {} candidate datasets", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::reconstruction::traits::ReconstructionError;

    #[test]
    fn test_enumerate_small() -> anyhow::Result<()> {
        let candidates = enumerate(6, 2, 0, 5)?;
        let ages: Vec<Vec<Age>> = candidates.iter().map(|c| c.ages()).collect();
        assert_eq!(ages, vec![vec![1, 5], vec![2, 4], vec![3, 3]]);
        Ok(())
    }

    #[test]
    fn test_sum_count_and_bounds_hold() -> anyhow::Result<()> {
        let candidates = enumerate(30, 5, 2, 9)?;
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert_eq!(candidate.len(), 5);
            assert_eq!(candidate.age_sum(), 30);
            assert!(candidate.records.iter().all(|r| (2..=9).contains(&r.age)));
        }
        Ok(())
    }

    #[test]
    fn test_no_duplicate_multisets() -> anyhow::Result<()> {
        let candidates = enumerate(20, 4, 0, 10)?;
        let distinct: HashSet<Vec<Age>> =
            candidates.iter().map(|c| c.sorted_ages()).collect();
        assert_eq!(distinct.len(), candidates.len());
        Ok(())
    }

    #[test]
    fn test_unreachable_targets_are_empty() -> anyhow::Result<()> {
        // Below count * min and above count * max.
        assert!(enumerate(5, 3, 2, 9)?.is_empty());
        assert!(enumerate(28, 3, 2, 9)?.is_empty());
        // No records but a non-zero total.
        assert!(enumerate(4, 0, 0, 9)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_dataset() -> anyhow::Result<()> {
        let candidates = enumerate(0, 0, 0, 9)?;
        assert_eq!(candidates.len(), 1);
        assert!(candidates.get(0).unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_min_above_max_is_invalid() {
        assert!(matches!(
            enumerate(10, 2, 8, 3),
            Err(ReconstructionError::InvalidConstraint(_))
        ));
    }

    #[test]
    fn test_budget_is_enforced() {
        let config = EngineConfig {
            max_sequences: 10,
            ..EngineConfig::mock()
        };
        let result = Enumerator::new(&config).enumerate(100, 4, 0, 100);
        assert!(matches!(
            result,
            Err(ReconstructionError::BudgetExhausted { limit: 10, .. })
        ));
    }
}
