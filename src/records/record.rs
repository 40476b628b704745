use std::fmt;

use serde::{Deserialize, Serialize};

/// Ages are the only numeric field reconstructed.
pub type Age = u32;

/// Categorical field targeted by a subgroup constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Gender,
    Condition,
    BloodType,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Gender => write!(f, "Gender"),
            Attribute::Condition => write!(f, "Condition"),
            Attribute::BloodType => write!(f, "Blood Type"),
        }
    }
}

/// One reconstructed record. It has no identity beyond its position in the
/// candidate that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub age: Age,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub blood_type: Option<String>,
}

impl Record {
    /// A record carrying only an age, as produced by the enumerator.
    pub fn with_age(age: Age) -> Self {
        Self {
            age,
            ..Default::default()
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::Gender => self.gender.as_deref(),
            Attribute::Condition => self.condition.as_deref(),
            Attribute::BloodType => self.blood_type.as_deref(),
        }
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: String) {
        let field = match attribute {
            Attribute::Gender => &mut self.gender,
            Attribute::Condition => &mut self.condition,
            Attribute::BloodType => &mut self.blood_type,
        };
        *field = Some(value);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "null".into());
        write!(
            f,
            "[Age: {}, Gender: {}, Blood Type: {}, Condition: {}]",
            self.age,
            show(&self.gender),
            show(&self.blood_type),
            show(&self.condition)
        )
    }
}
