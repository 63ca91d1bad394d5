use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A capability an employee can hold and a schedule can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeSkill {
    Petting,
    Walking,
    Feeding,
    Medicating,
    Shaving,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skill '{0}'")]
pub struct ParseSkillError(pub String);

impl EmployeeSkill {
    pub const ALL: [EmployeeSkill; 5] = [
        EmployeeSkill::Petting,
        EmployeeSkill::Walking,
        EmployeeSkill::Feeding,
        EmployeeSkill::Medicating,
        EmployeeSkill::Shaving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeSkill::Petting => "PETTING",
            EmployeeSkill::Walking => "WALKING",
            EmployeeSkill::Feeding => "FEEDING",
            EmployeeSkill::Medicating => "MEDICATING",
            EmployeeSkill::Shaving => "SHAVING",
        }
    }

    /// Parses a comma separated list such as `feeding,petting`. Blank entries are skipped.
    pub fn parse_set(input: &str) -> Result<BTreeSet<EmployeeSkill>, ParseSkillError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(EmployeeSkill::from_str)
            .collect()
    }
}

impl fmt::Display for EmployeeSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeSkill {
    type Err = ParseSkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        EmployeeSkill::ALL
            .into_iter()
            .find(|skill| skill.as_str() == normalized)
            .ok_or_else(|| ParseSkillError(s.to_string()))
    }
}
