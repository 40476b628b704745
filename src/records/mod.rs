pub mod candidate;
pub mod record;

pub use candidate::{Candidate, CandidateSet};
pub use record::{Age, Attribute, Record};
