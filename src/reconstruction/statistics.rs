use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traits::{ReconstructionError, Result};
use crate::records::{Age, Attribute, Record};

/// Count and average age of the records sharing one attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupStatistics {
    pub attribute: Attribute,
    pub label: String,
    pub count: usize,
    pub average: f64,
}

impl SubgroupStatistics {
    /// Statistics of the records whose `attribute` equals `label`. The
    /// average of an empty subgroup is reported as 0.
    pub fn of(records: &[Record], attribute: Attribute, label: &str) -> Self {
        let ages: Vec<Age> = records
            .iter()
            .filter(|r| r.attribute(attribute) == Some(label))
            .map(|r| r.age)
            .collect();
        Self {
            attribute,
            label: label.to_string(),
            count: ages.len(),
            average: mean(&ages).unwrap_or(0.0),
        }
    }

    /// One entry per distinct value of `attribute`, ordered by value.
    /// Records without a value are skipped.
    pub fn per_value(records: &[Record], attribute: Attribute) -> Vec<Self> {
        let mut groups: BTreeMap<&str, Vec<Age>> = BTreeMap::new();
        for record in records {
            if let Some(value) = record.attribute(attribute) {
                groups.entry(value).or_default().push(record.age);
            }
        }
        groups
            .into_iter()
            .map(|(label, ages)| Self {
                attribute,
                label: label.to_string(),
                count: ages.len(),
                average: mean(&ages).unwrap_or(0.0),
            })
            .collect()
    }
}

/// Everything released about the hidden dataset. Optional statistics that
/// were not released are skipped by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasedStatistics {
    pub count: usize,
    pub average: f64,
    pub range: Option<(Age, Age)>,
    pub median: Option<f64>,
    pub subgroups: Vec<SubgroupStatistics>,
}

impl ReleasedStatistics {
    pub fn new(count: usize, average: f64) -> Self {
        Self {
            count,
            average,
            range: None,
            median: None,
            subgroups: vec![],
        }
    }

    /// Total age implied by the count and the average.
    pub fn age_sum(&self) -> Result<u32> {
        age_sum(self.count, self.average)
    }

    /// Computes the statistics a curator would release about `records`,
    /// including one subgroup per requested `(attribute, label)`.
    pub fn from_records(
        records: &[Record],
        subgroups: &[(Attribute, &str)],
    ) -> Self {
        let ages: Vec<Age> = records.iter().map(|r| r.age).collect();
        let range = ages
            .iter()
            .min()
            .copied()
            .zip(ages.iter().max().copied());
        Self {
            count: records.len(),
            average: mean(&ages).unwrap_or(0.0),
            range,
            median: median(&ages),
            subgroups: subgroups
                .iter()
                .map(|(attribute, label)| {
                    SubgroupStatistics::of(records, *attribute, label)
                })
                .collect(),
        }
    }
}

/// `round(count * average)`, the total age of `count` records with the
/// given average.
pub fn age_sum(count: usize, average: f64) -> Result<u32> {
    if !average.is_finite() || average < 0.0 {
        return Err(ReconstructionError::InvalidConstraint(format!(
            "average age {average} must be a non-negative number"
        )));
    }
    let sum = (count as f64 * average).round();
    if sum > u32::MAX as f64 {
        return Err(ReconstructionError::InvalidConstraint(format!(
            "total age {sum} is out of range"
        )));
    }
    Ok(sum as u32)
}

pub fn mean(ages: &[Age]) -> Option<f64> {
    if ages.is_empty() {
        return None;
    }
    let total: u64 = ages.iter().map(|&a| a as u64).sum();
    Some(total as f64 / ages.len() as f64)
}

pub fn median(ages: &[Age]) -> Option<f64> {
    let mut sorted = ages.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2] as f64),
        _ => Some((sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn patient(age: Age, gender: &str, condition: &str, blood_type: &str) -> Record {
        Record {
            age,
            gender: Some(gender.to_string()),
            condition: Some(condition.to_string()),
            blood_type: Some(blood_type.to_string()),
        }
    }

    #[test]
    fn test_released_statistics() {
        let records = vec![
            patient(30, "Male", "Asthma", "A+"),
            patient(45, "Female", "Cancer", "O-"),
            patient(61, "Male", "Asthma", "A+"),
            patient(52, "Female", "Obesity", "B+"),
        ];
        let stats = ReleasedStatistics::from_records(
            &records,
            &[(Attribute::Gender, "Male"), (Attribute::Condition, "Asthma")],
        );

        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.average, 47.0);
        assert_eq!(stats.range, Some((30, 61)));
        assert_relative_eq!(stats.median.unwrap(), 48.5);
        assert_eq!(stats.age_sum().unwrap(), 188);

        let male = &stats.subgroups[0];
        assert_eq!(male.count, 2);
        assert_relative_eq!(male.average, 45.5);
    }

    #[test]
    fn test_per_value() {
        let records = vec![
            patient(20, "Male", "Asthma", "A+"),
            patient(40, "Female", "Asthma", "O-"),
            patient(33, "Male", "Cancer", "A+"),
        ];
        let per_type = SubgroupStatistics::per_value(&records, Attribute::BloodType);
        let labels: Vec<&str> = per_type.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["A+", "O-"]);
        assert_eq!(per_type[0].count, 2);
        assert_relative_eq!(per_type[0].average, 26.5);
    }

    #[test]
    fn test_age_sum_rounding() {
        assert_eq!(age_sum(3, 33.4).unwrap(), 100);
        assert_eq!(age_sum(2, 4.25).unwrap(), 9);
        assert_eq!(age_sum(0, 50.0).unwrap(), 0);
        assert!(age_sum(3, f64::NAN).is_err());
        assert!(age_sum(3, -2.0).is_err());
    }

    #[test]
    fn test_empty_records() {
        let stats = ReleasedStatistics::from_records(&[], &[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.range, None);
        assert_eq!(stats.median, None);
    }
}
