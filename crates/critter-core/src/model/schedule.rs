use super::{EmployeeSkill, Id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single-day booking. Employees and pets are referenced by id, in the
/// order the caller supplied them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Id,
    pub employee_ids: Vec<Id>,
    pub pet_ids: Vec<Id>,
    pub date: NaiveDate,
    #[serde(default)]
    pub activities: BTreeSet<EmployeeSkill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    #[serde(default)]
    pub employee_ids: Vec<Id>,
    #[serde(default)]
    pub pet_ids: Vec<Id>,
    pub date: NaiveDate,
    #[serde(default)]
    pub activities: BTreeSet<EmployeeSkill>,
}

impl NewSchedule {
    pub fn new(
        pet_ids: Vec<Id>,
        employee_ids: Vec<Id>,
        date: NaiveDate,
        activities: BTreeSet<EmployeeSkill>,
    ) -> Self {
        Self {
            employee_ids,
            pet_ids,
            date,
            activities,
        }
    }

    pub(crate) fn into_schedule(self, id: Id) -> Schedule {
        Schedule {
            id,
            employee_ids: self.employee_ids,
            pet_ids: self.pet_ids,
            date: self.date,
            activities: self.activities,
        }
    }
}
