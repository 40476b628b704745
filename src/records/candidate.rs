use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::record::{Age, Record};
use crate::reconstruction::statistics::median;

/// One complete hypothesis for the hidden dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub records: Vec<Record>,
}

impl Candidate {
    /// Wraps a sequence of ages into age-only records.
    pub fn from_ages(ages: &[Age]) -> Self {
        Self {
            records: ages.iter().copied().map(Record::with_age).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ages(&self) -> Vec<Age> {
        self.records.iter().map(|r| r.age).collect()
    }

    pub fn sorted_ages(&self) -> Vec<Age> {
        let mut ages = self.ages();
        ages.sort_unstable();
        ages
    }

    pub fn age_sum(&self) -> u64 {
        self.records.iter().map(|r| r.age as u64).sum()
    }

    /// Median age: the middle value for odd counts, the mean of the two
    /// middle values for even counts. `None` for an empty candidate.
    pub fn median_age(&self) -> Option<f64> {
        median(&self.ages())
    }
}

/// Working collection of candidates. Stages narrow it in place and never
/// grow it back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Keeps the candidates for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Candidate) -> bool) {
        self.candidates.retain(keep);
    }

    /// Like `retain`, but the predicate may also edit the candidates it
    /// keeps. Candidates are visited in order.
    pub fn retain_mut(&mut self, keep: impl FnMut(&mut Candidate) -> bool) {
        self.candidates.retain_mut(keep);
    }

    /// Renders the first `limit` candidates, one record per line, with
    /// alternatives separated by `-- OR --`.
    pub fn preview(&self, limit: usize) -> String {
        let mut out = String::new();
        for candidate in self.candidates.iter().take(limit) {
            for record in &candidate.records {
                let _ = writeln!(out, "{record}");
            }
            let _ = writeln!(out, "-- OR --");
        }
        if self.candidates.len() > limit {
            let _ = writeln!(out, "... And more ...");
        }
        out
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
