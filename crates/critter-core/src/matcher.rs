use crate::model::{Employee, EmployeeSkill};
use crate::persistence::{EntityStore, StoreResult};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::debug;

/// An employee qualifies when they hold every required skill and work on the
/// weekday `date` falls on. An empty skill set only checks availability.
pub fn is_qualified(employee: &Employee, required: &BTreeSet<EmployeeSkill>, date: NaiveDate) -> bool {
    employee.has_skills(required) && employee.is_available_on(date)
}

pub fn qualified<'a, I>(
    employees: I,
    required: &'a BTreeSet<EmployeeSkill>,
    date: NaiveDate,
) -> impl Iterator<Item = Employee> + 'a
where
    I: IntoIterator<Item = Employee>,
    I::IntoIter: 'a,
{
    employees
        .into_iter()
        .filter(move |employee| is_qualified(employee, required, date))
}

/// Answers "who can do these activities on this day" against a store.
pub struct AvailabilityMatcher<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> AvailabilityMatcher<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    pub fn find_qualified_employees(
        &self,
        required: &BTreeSet<EmployeeSkill>,
        date: NaiveDate,
    ) -> StoreResult<Vec<Employee>> {
        let employees = self.store.all_employees()?;
        let scanned = employees.len();
        let matches: Vec<Employee> = qualified(employees, required, date).collect();
        debug!(
            skills = ?required,
            %date,
            weekday = %date.weekday(),
            scanned,
            matched = matches.len(),
            "matched employees for service"
        );
        Ok(matches)
    }
}
