use std::collections::HashMap;

use super::traits::{ReconstructionError, Result};
use crate::records::Age;

/// Memo table of bounded integer partitions.
///
/// An entry keyed by `(sum, count)` holds every non-decreasing sequence of
/// `count` values in `[min, max]` that adds up to `sum`. A table is tied to
/// one pair of bounds and lives for a single enumeration.
#[derive(Debug)]
pub struct PartitionTable {
    min: Age,
    max: Age,
    max_sequences: usize,
    materialized: usize,
    entries: HashMap<(u32, usize), Vec<Vec<Age>>>,
}

impl PartitionTable {
    pub fn new(min: Age, max: Age, max_sequences: usize) -> Result<Self> {
        if min > max {
            return Err(ReconstructionError::InvalidConstraint(format!(
                "minimum {min} is greater than maximum {max}"
            )));
        }
        Ok(Self {
            min,
            max,
            max_sequences,
            materialized: 0,
            entries: HashMap::new(),
        })
    }

    /// Number of distinct `(sum, count)` subproblems solved so far.
    pub fn subproblems(&self) -> usize {
        self.entries.len()
    }

    /// Total number of sequences stored across all entries.
    pub fn materialized(&self) -> usize {
        self.materialized
    }

    /// Sequences for `(target, count)`, empty if never filled or infeasible.
    pub fn get(&self, target: u32, count: usize) -> &[Vec<Age>] {
        self.entries
            .get(&(target, count))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Consumes the table, keeping only the entry for `(target, count)`.
    pub fn take(mut self, target: u32, count: usize) -> Vec<Vec<Age>> {
        self.entries.remove(&(target, count)).unwrap_or_default()
    }

    /// Whether `target` can be reached with `count` values in bounds at all.
    fn reachable(&self, target: u32, count: usize) -> bool {
        let count = count as u64;
        let target = target as u64;
        count * self.min as u64 <= target && target <= count * self.max as u64
    }

    /// Fills the entry for `(target, count)` and every subproblem it needs.
    pub fn fill(&mut self, target: u32, count: usize) -> Result<()> {
        if self.entries.contains_key(&(target, count)) {
            return Ok(());
        }

        let sequences = if !self.reachable(target, count) {
            // Also covers count == 0 with a non-zero target.
            vec![]
        } else if count == 0 {
            vec![vec![]]
        } else if count == 1 {
            vec![vec![target]]
        } else {
            let mut sequences = vec![];
            let ceiling = self.max.min(target);
            for first in self.min..=ceiling {
                let rest = target - first;
                self.fill(rest, count - 1)?;

                let tails = self.entries.get(&(rest, count - 1));
                for tail in tails.into_iter().flatten() {
                    // Keep the sequence non-decreasing so that each multiset
                    // shows up once.
                    if tail[0] < first {
                        continue;
                    }
                    self.materialized += 1;
                    if self.materialized > self.max_sequences {
                        return Err(ReconstructionError::BudgetExhausted {
                            what: "enumerating partitions",
                            limit: self.max_sequences,
                        });
                    }
                    let mut sequence = Vec::with_capacity(count);
                    sequence.push(first);
                    sequence.extend_from_slice(tail);
                    sequences.push(sequence);
                }
            }
            sequences
        };

        if count <= 1 {
            self.materialized += sequences.len();
        }
        self.entries.insert((target, count), sequences);
        Ok(())
    }
}
