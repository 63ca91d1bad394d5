use crate::model::{EmployeeSkill, Id, NewSchedule, Schedule};
use crate::persistence::{EntityStore, StoreResult};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Creates schedules and resolves them by employee, pet or customer.
///
/// Skills and availability of the assigned employees are not checked here;
/// callers that care ask the [`AvailabilityMatcher`](crate::matcher::AvailabilityMatcher)
/// first.
pub struct ScheduleManager<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> ScheduleManager<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    pub fn create_schedule(
        &self,
        pet_ids: Vec<Id>,
        employee_ids: Vec<Id>,
        date: NaiveDate,
        activities: BTreeSet<EmployeeSkill>,
    ) -> StoreResult<Schedule> {
        let resolved = pet_ids
            .iter()
            .try_for_each(|id| self.store.find_pet(*id).map(drop))
            .and_then(|_| {
                employee_ids
                    .iter()
                    .try_for_each(|id| self.store.find_employee(*id).map(drop))
            });
        if let Err(err) = resolved {
            warn!(%date, error = %err, "schedule references unknown entity");
            return Err(err);
        }

        let schedule = self
            .store
            .save_schedule(NewSchedule::new(pet_ids, employee_ids, date, activities))?;
        info!(
            schedule_id = schedule.id,
            %date,
            pets = schedule.pet_ids.len(),
            employees = schedule.employee_ids.len(),
            "schedule created"
        );
        Ok(schedule)
    }

    pub fn all_schedules(&self) -> StoreResult<Vec<Schedule>> {
        self.store.all_schedules()
    }

    pub fn schedules_for_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>> {
        traced("employee", employee_id, self.store.schedules_by_employee(employee_id))
    }

    pub fn schedules_for_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>> {
        traced("pet", pet_id, self.store.schedules_by_pet(pet_id))
    }

    /// Union of the schedules of every pet the customer owns, deduplicated
    /// and in creation order.
    pub fn schedules_for_customer(&self, customer_id: Id) -> StoreResult<Vec<Schedule>> {
        let schedules: StoreResult<Vec<Schedule>> =
            self.store.find_customer(customer_id).and_then(|customer| {
                let mut merged = BTreeMap::new();
                for pet_id in customer.pet_ids {
                    for schedule in self.store.schedules_by_pet(pet_id)? {
                        merged.entry(schedule.id).or_insert(schedule);
                    }
                }
                Ok(merged.into_values().collect())
            });
        traced("customer", customer_id, schedules)
    }
}

fn traced(by: &'static str, id: Id, result: StoreResult<Vec<Schedule>>) -> StoreResult<Vec<Schedule>> {
    match &result {
        Ok(schedules) => debug!(by, id, found = schedules.len(), "schedule lookup"),
        Err(err) if err.is_not_found() => warn!(by, id, error = %err, "schedule lookup failed"),
        Err(_) => {}
    }
    result
}
