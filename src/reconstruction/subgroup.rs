use log::{info, log_enabled, trace, Level};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::{
    combinations::Combinations,
    traits::{CandidateFilter, ReconstructionError, Result, StageReport},
};
use crate::{
    config::EngineConfig,
    records::{Age, Attribute, Candidate, CandidateSet},
};

/// Medical conditions used as filler for records outside a condition
/// subgroup.
pub const CONDITIONS: [&str; 6] = [
    "Arthritis",
    "Asthma",
    "Cancer",
    "Diabetes",
    "Hypertension",
    "Obesity",
];

/// Blood types used as filler for records outside a blood type subgroup.
pub const BLOOD_TYPES: [&str; 8] =
    ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

const OTHER: &str = "Other";

/// Assigns a subgroup to every candidate of the set, using the default
/// budget and filler seed. See [`SubgroupAssigner`].
pub fn assign_subgroup(
    candidates: &mut CandidateSet,
    attribute: Attribute,
    label: &str,
    size: usize,
    average: f64,
) -> Result<StageReport> {
    let constraint = SubgroupConstraint::new(attribute, label, size, average)?;
    SubgroupAssigner::from_config(constraint, &EngineConfig::default())
        .apply(candidates)
}

/// Released count and average age of the records carrying `label`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgroupConstraint {
    pub attribute: Attribute,
    pub label: String,
    pub size: usize,
    pub average: f64,
}

impl SubgroupConstraint {
    pub fn new(
        attribute: Attribute,
        label: &str,
        size: usize,
        average: f64,
    ) -> Result<Self> {
        if !average.is_finite() || average < 0.0 {
            return Err(ReconstructionError::InvalidConstraint(format!(
                "average age {average} of {label} must be a non-negative number"
            )));
        }
        Ok(Self {
            attribute,
            label: label.to_string(),
            size,
            average,
        })
    }

    /// Total age of the subgroup, rounded to the nearest integer.
    pub fn required_sum(&self) -> u64 {
        (self.size as f64 * self.average).round() as u64
    }
}

/// Value given to the records left outside the subgroup. It is display
/// filler, not evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Complement {
    /// Binary attributes: everybody else gets the other value.
    Fixed(String),

    /// Open-ended attributes: a value drawn from a vocabulary.
    Vocabulary(Vec<String>),
}

impl Complement {
    /// Default complement of `label` for `attribute`. The label itself never
    /// appears in a vocabulary.
    pub fn for_attribute(attribute: Attribute, label: &str) -> Self {
        match attribute {
            Attribute::Gender => {
                let other = if label.eq_ignore_ascii_case("male") {
                    "Female"
                } else if label.eq_ignore_ascii_case("female") {
                    "Male"
                } else {
                    OTHER
                };
                Complement::Fixed(other.to_string())
            }
            Attribute::Condition => Self::vocabulary(&CONDITIONS, label),
            Attribute::BloodType => Self::vocabulary(&BLOOD_TYPES, label),
        }
    }

    fn vocabulary(values: &[&str], label: &str) -> Self {
        let values = values
            .iter()
            .filter(|v| !v.eq_ignore_ascii_case(label))
            .map(|v| v.to_string())
            .collect();
        Complement::Vocabulary(values)
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> String {
        match self {
            Complement::Fixed(value) => value.clone(),
            Complement::Vocabulary(values) => values
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| OTHER.to_string()),
        }
    }
}

/// Narrows a candidate set with a subgroup constraint, labelling the kept
/// candidates.
///
/// For each candidate, an exhaustive subset-sum search over its sorted ages
/// looks for `size` records whose ages add up to the required sum. The first
/// subset found (smallest ages first, inclusion tried before exclusion) gets
/// the label and the rest gets the complement. Candidates with no such
/// subset are removed. Other feasible subsets may exist; the report counts
/// how many candidates had only one possible multiset of subgroup ages.
///
/// The stage is all or nothing: every candidate is decided before any is
/// removed or relabelled, so a budget error leaves the set untouched.
#[derive(Debug)]
pub struct SubgroupAssigner<R: Rng = ChaCha20Rng> {
    pub constraint: SubgroupConstraint,
    pub complement: Complement,
    rng: R,
    max_search_steps: usize,
}

/// Outcome of the search for one candidate, computed before anything is
/// mutated.
#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    /// No subgroup fits: drop the candidate.
    Prune,

    /// Empty subgroup: keep the candidate as is.
    Keep,

    /// Label the records flagged in `members`.
    Label {
        members: Vec<bool>,
        forcedness: Forcedness,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forcedness {
    Forced,
    Ambiguous,
    Undetermined,
}

impl SubgroupAssigner<ChaCha20Rng> {
    /// Assigner with the default complement, seeded from the config.
    pub fn from_config(constraint: SubgroupConstraint, config: &EngineConfig) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(config.filler_seed);
        Self::new(constraint, rng, config.max_search_steps)
    }
}

impl<R: Rng> SubgroupAssigner<R> {
    pub fn new(constraint: SubgroupConstraint, rng: R, max_search_steps: usize) -> Self {
        let complement =
            Complement::for_attribute(constraint.attribute, &constraint.label);
        Self {
            constraint,
            complement,
            rng,
            max_search_steps,
        }
    }

    pub fn with_complement(mut self, complement: Complement) -> Self {
        self.complement = complement;
        self
    }

    /// Decides what happens to `candidate` without touching it.
    fn decide(&self, candidate: &Candidate) -> Result<Verdict> {
        let size = self.constraint.size;
        if size > candidate.len() {
            return Ok(Verdict::Prune);
        }
        if size == 0 {
            return Ok(Verdict::Keep);
        }

        // Sorted view of the ages, remembering where each one came from.
        let mut order: Vec<usize> = (0..candidate.len()).collect();
        order.sort_by_key(|&i| candidate.records[i].age);
        let ages: Vec<Age> =
            order.iter().map(|&i| candidate.records[i].age).collect();

        let target = self.constraint.required_sum();
        let found = SubsetSearch::new(&ages, self.max_search_steps).run(size, target)?;
        let Some(positions) = found else {
            if log_enabled!(Level::Trace) {
                if let Some(closest) = closest_sum(&ages, size, target) {
                    trace!(
                        "Pruned {ages:?}: no {size} ages sum to {target}, closest is {closest}"
                    );
                }
            }
            return Ok(Verdict::Prune);
        };

        // Fresh budget: running out here only leaves forcedness open.
        let forcedness = match SubsetSearch::new(&ages, self.max_search_steps)
            .distinct(size, target, 2)
        {
            Ok(hits) if hits.len() == 1 => Forcedness::Forced,
            Ok(_) => Forcedness::Ambiguous,
            Err(ReconstructionError::BudgetExhausted { .. }) => Forcedness::Undetermined,
            Err(e) => return Err(e),
        };

        let mut members = vec![false; candidate.len()];
        for &p in &positions {
            members[order[p]] = true;
        }
        Ok(Verdict::Label {
            members,
            forcedness,
        })
    }

    /// Writes the label on members and a filler value on everybody else.
    fn label(&mut self, candidate: &mut Candidate, members: &[bool]) {
        let attribute = self.constraint.attribute;
        for (record, &member) in candidate.records.iter_mut().zip(members) {
            let value = if member {
                self.constraint.label.clone()
            } else {
                self.complement.draw(&mut self.rng)
            };
            record.set_attribute(attribute, value);
        }
    }
}

impl<R: Rng + std::fmt::Debug> CandidateFilter for SubgroupAssigner<R> {
    fn apply(&mut self, candidates: &mut CandidateSet) -> Result<StageReport> {
        let before = candidates.len();
        let verdicts = candidates
            .iter()
            .map(|candidate| self.decide(candidate))
            .collect::<Result<Vec<_>>>()?;

        let mut report = StageReport::new(before, before);
        for verdict in &verdicts {
            if let Verdict::Label { forcedness, .. } = verdict {
                match forcedness {
                    Forcedness::Forced => report.forced += 1,
                    Forcedness::Undetermined => report.undetermined += 1,
                    Forcedness::Ambiguous => {}
                }
            }
        }

        let mut verdicts = verdicts.into_iter();
        candidates.retain_mut(|candidate| match verdicts.next() {
            Some(Verdict::Label { members, .. }) => {
                self.label(candidate, &members);
                true
            }
            Some(Verdict::Keep) => true,
            Some(Verdict::Prune) | None => false,
        });
        report.after = candidates.len();

        info!(
            "{} {:?} (count {}, average {}) kept {} of {before} candidates, {} forced, {} undetermined",
            self.constraint.attribute,
            self.constraint.label,
            self.constraint.size,
            self.constraint.average,
            report.after,
            report.forced,
            report.undetermined
        );
        Ok(report)
    }
}

/// Exhaustive include/exclude search for `k` of the sorted `ages` adding up
/// to a target.
///
/// Branches are cut when the `k` smallest or `k` largest remaining ages
/// cannot bracket the remaining sum. Excluding an age also excludes its
/// duplicates, so each multiset of ages is visited at most once.
struct SubsetSearch<'a> {
    ages: &'a [Age],

    /// `prefix[i]` is the sum of `ages[..i]`.
    prefix: Vec<u64>,
    steps: usize,
    limit: usize,
    hits: Vec<Vec<usize>>,
    wanted: usize,
}

impl<'a> SubsetSearch<'a> {
    fn new(ages: &'a [Age], limit: usize) -> Self {
        let mut prefix = Vec::with_capacity(ages.len() + 1);
        prefix.push(0);
        for &age in ages {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + age as u64);
        }
        Self {
            ages,
            prefix,
            steps: 0,
            limit,
            hits: vec![],
            wanted: 1,
        }
    }

    /// Positions (into `ages`) of the first subset found, if any.
    fn run(&mut self, k: usize, target: u64) -> Result<Option<Vec<usize>>> {
        let mut hits = self.distinct(k, target, 1)?;
        Ok(hits.pop())
    }

    /// Up to `wanted` subsets whose age multisets all differ, in search
    /// order.
    fn distinct(
        &mut self,
        k: usize,
        target: u64,
        wanted: usize,
    ) -> Result<Vec<Vec<usize>>> {
        self.wanted = wanted;
        self.hits.clear();
        let mut chosen = Vec::with_capacity(k);
        self.search(0, k, target, &mut chosen)?;
        Ok(std::mem::take(&mut self.hits))
    }

    /// Returns true once enough subsets have been collected.
    fn search(
        &mut self,
        start: usize,
        k: usize,
        remaining: u64,
        chosen: &mut Vec<usize>,
    ) -> Result<bool> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(ReconstructionError::BudgetExhausted {
                what: "searching for a subgroup",
                limit: self.limit,
            });
        }

        if k == 0 {
            if remaining == 0 {
                self.hits.push(chosen.clone());
                return Ok(self.hits.len() >= self.wanted);
            }
            return Ok(false);
        }
        let n = self.ages.len();
        if n - start < k {
            return Ok(false);
        }

        let smallest = self.prefix[start + k] - self.prefix[start];
        let largest = self.prefix[n] - self.prefix[n - k];
        if smallest > remaining || largest < remaining {
            return Ok(false);
        }

        let age = self.ages[start];
        chosen.push(start);
        if self.search(start + 1, k - 1, remaining - age as u64, chosen)? {
            return Ok(true);
        }
        chosen.pop();

        let next = start + self.ages[start..].partition_point(|&a| a == age);
        self.search(next, k, remaining, chosen)
    }
}

/// Largest number of combinations swept by [`closest_sum`].
const CLOSEST_SUM_SWEEP: u128 = 4096;

/// Sum of `k` ages closest to `target`. Only computed when there are at most
/// [`CLOSEST_SUM_SWEEP`] combinations to try.
fn closest_sum(ages: &[Age], k: usize, target: u64) -> Option<u64> {
    if k > ages.len() || binomial(ages.len(), k) > CLOSEST_SUM_SWEEP {
        return None;
    }
    Combinations::new(ages.len(), k)
        .map(|c| c.iter().map(|&i| ages[i] as u64).sum::<u64>())
        .min_by_key(|&sum| sum.abs_diff(target))
}

/// `n` choose `k`, saturating just above the sweep limit.
fn binomial(n: usize, k: usize) -> u128 {
    let k = k.min(n - k);
    let mut value: u128 = 1;
    for i in 0..k {
        value = value * (n - i) as u128 / (i + 1) as u128;
        if value > CLOSEST_SUM_SWEEP {
            return CLOSEST_SUM_SWEEP + 1;
        }
    }
    value
}
