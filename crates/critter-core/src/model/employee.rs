use super::{EmployeeSkill, Id, weekdays};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub skills: BTreeSet<EmployeeSkill>,
    #[serde(default, with = "weekdays")]
    pub days_available: HashSet<Weekday>,
}

impl Employee {
    pub fn has_skills(&self, required: &BTreeSet<EmployeeSkill>) -> bool {
        required.is_subset(&self.skills)
    }

    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.days_available.contains(&date.weekday())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub skills: BTreeSet<EmployeeSkill>,
    #[serde(default, with = "weekdays")]
    pub days_available: HashSet<Weekday>,
}

impl NewEmployee {
    /// Starts with no skills and no available days.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skills: BTreeSet::new(),
            days_available: HashSet::new(),
        }
    }

    pub fn with_skills<I>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = EmployeeSkill>,
    {
        self.skills = skills.into_iter().collect();
        self
    }

    pub fn available_on<I>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        self.days_available = days.into_iter().collect();
        self
    }

    pub(crate) fn into_employee(self, id: Id) -> Employee {
        Employee {
            id,
            name: self.name,
            skills: self.skills,
            days_available: self.days_available,
        }
    }
}
