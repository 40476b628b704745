use std::fmt::Debug;

use thiserror::Error;

use crate::records::candidate::CandidateSet;

/// Error returned by the reconstruction stages.
///
/// Infeasibility is not an error: a stage that leaves no candidate returns
/// `Ok` and an empty set. These variants are reserved for inputs that are
/// self-contradictory and for searches that ran over their budget.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconstructionError {
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Budget exhausted while {what} (limit {limit})")]
    BudgetExhausted { what: &'static str, limit: usize },
}

pub type Result<T> = std::result::Result<T, ReconstructionError>;

/// Summary of one stage applied to a candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageReport {
    /// Number of candidates before the stage ran.
    pub before: usize,

    /// Number of candidates left after the stage ran.
    pub after: usize,

    /// Candidates whose subgroup membership is pinned to a single multiset
    /// of ages. Always zero for stages that do not assign labels.
    pub forced: usize,

    /// Labelled candidates for which no verdict on forcedness was reached
    /// within the search budget. Counted in neither `forced` nor the rest.
    pub undetermined: usize,
}

impl StageReport {
    pub fn new(before: usize, after: usize) -> Self {
        Self {
            before,
            after,
            forced: 0,
            undetermined: 0,
        }
    }

    pub fn removed(&self) -> usize {
        self.before - self.after
    }

    /// No candidate survived: the released statistics are jointly
    /// unsatisfiable under the current hypotheses.
    pub fn is_infeasible(&self) -> bool {
        self.after == 0
    }

    /// Exactly one candidate is left, i.e. a full reconstruction.
    pub fn is_unique(&self) -> bool {
        self.after == 1
    }
}

/// Trait for a stage that narrows a candidate set in place.
///
/// Stages never grow the set. A stage may also mutate the records of the
/// candidates it keeps (see the subgroup assigner).
pub trait CandidateFilter: Debug {
    /// Applies the stage to `candidates`.
    fn apply(&mut self, candidates: &mut CandidateSet) -> Result<StageReport>;
}
