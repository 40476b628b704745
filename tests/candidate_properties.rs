use std::collections::HashSet;

use reconlib::{
    reconstruction::{
        assign_subgroup, enumerate, filter_by_median, filter_by_range,
        traits::ReconstructionError,
    },
    records::{Age, Attribute, Candidate, CandidateSet},
};

#[test]
fn enumeration_respects_sum_count_and_bounds() -> Result<(), anyhow::Error> {
    for (sum, count, lo, hi) in [(6, 2, 0, 5), (30, 4, 3, 12), (17, 5, 1, 6), (0, 3, 0, 4)] {
        let candidates = enumerate(sum, count, lo, hi)?;
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert_eq!(candidate.len(), count);
            assert_eq!(candidate.age_sum(), sum as u64);
            assert!(candidate.records.iter().all(|r| (lo..=hi).contains(&r.age)));
        }
    }
    Ok(())
}

#[test]
fn enumeration_has_no_permutations() -> Result<(), anyhow::Error> {
    let candidates = enumerate(24, 5, 0, 12)?;
    let multisets: HashSet<Vec<Age>> = candidates.iter().map(|c| c.sorted_ages()).collect();
    assert_eq!(multisets.len(), candidates.len());
    for candidate in &candidates {
        assert_eq!(candidate.ages(), candidate.sorted_ages());
    }
    Ok(())
}

#[test]
fn enumeration_outside_reachable_range_is_empty() -> Result<(), anyhow::Error> {
    // count * lo = 12 and count * hi = 36.
    assert!(enumerate(11, 4, 3, 9)?.is_empty());
    assert!(enumerate(37, 4, 3, 9)?.is_empty());
    assert!(!enumerate(12, 4, 3, 9)?.is_empty());
    assert!(!enumerate(36, 4, 3, 9)?.is_empty());
    Ok(())
}

#[test]
fn six_over_two_has_three_candidates() -> Result<(), anyhow::Error> {
    let candidates = enumerate(6, 2, 0, 5)?;
    let ages: Vec<Vec<Age>> = candidates.iter().map(|c| c.ages()).collect();
    assert_eq!(ages, vec![vec![1, 5], vec![2, 4], vec![3, 3]]);
    Ok(())
}

#[test]
fn range_filter_drops_out_of_range_ages() -> Result<(), anyhow::Error> {
    let mut candidates = enumerate(10, 4, 0, 10)?;
    filter_by_range(&mut candidates, 0, 3)?;
    assert!(!candidates.is_empty());
    assert!(candidates.iter().all(|c| c.records.iter().all(|r| r.age < 4)));
    Ok(())
}

#[test]
fn median_filter_is_idempotent() -> Result<(), anyhow::Error> {
    let mut candidates = enumerate(33, 6, 0, 15)?;
    filter_by_median(&mut candidates, 5.5)?;
    let once = candidates.clone();
    filter_by_median(&mut candidates, 5.5)?;
    assert_eq!(once, candidates);
    Ok(())
}

#[test]
fn subgroup_assignment_never_grows_the_set() -> Result<(), anyhow::Error> {
    let mut candidates = enumerate(45, 5, 2, 18)?;
    let mut previous = candidates.len();
    for (attribute, label, size, average) in [
        (Attribute::Gender, "Male", 3, 9.0),
        (Attribute::Condition, "Diabetes", 2, 8.5),
        (Attribute::BloodType, "AB-", 1, 4.0),
    ] {
        let report = assign_subgroup(&mut candidates, attribute, label, size, average)?;
        assert_eq!(report.before, previous);
        assert!(report.after <= report.before);
        previous = report.after;
    }
    assert_eq!(candidates.len(), previous);
    Ok(())
}

#[test]
fn subgroup_assignment_on_known_candidate() -> Result<(), anyhow::Error> {
    let mut candidates = CandidateSet::new(vec![Candidate::from_ages(&[2, 4, 6, 8])]);
    assign_subgroup(&mut candidates, Attribute::Gender, "Male", 2, 4.0)?;

    let candidate = candidates.get(0).unwrap();
    let males: Vec<Age> = candidate
        .records
        .iter()
        .filter(|r| r.gender.as_deref() == Some("Male"))
        .map(|r| r.age)
        .collect();
    assert_eq!(males, vec![2, 6]);
    assert!(candidate
        .records
        .iter()
        .filter(|r| r.gender.as_deref() != Some("Male"))
        .all(|r| r.gender.as_deref() == Some("Female")));
    Ok(())
}

#[test]
fn oversized_subgroup_removes_candidate() -> Result<(), anyhow::Error> {
    let mut candidates = CandidateSet::new(vec![
        Candidate::from_ages(&[2, 4, 6, 8]),
        Candidate::from_ages(&[5, 5, 5, 5]),
    ]);
    let report = assign_subgroup(&mut candidates, Attribute::Gender, "Male", 6, 5.0)?;
    assert_eq!(report.before, 2);
    assert!(report.is_infeasible());
    Ok(())
}

#[test]
fn inverted_bounds_are_invalid() {
    assert!(matches!(
        enumerate(10, 2, 9, 1),
        Err(ReconstructionError::InvalidConstraint(_))
    ));
    let mut candidates = CandidateSet::default();
    assert!(matches!(
        filter_by_range(&mut candidates, 9, 1),
        Err(ReconstructionError::InvalidConstraint(_))
    ));
}
