use crate::matcher::AvailabilityMatcher;
use crate::model::{
    Customer, Employee, EmployeeSkill, Id, NewCustomer, NewEmployee, NewPet, Pet, Schedule,
};
use crate::persistence::{EntityStore, StoreResult};
use crate::scheduling::ScheduleManager;
use chrono::{NaiveDate, Weekday};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::info;

/// Single entry point for the HTTP API and the console: entity records,
/// availability matching and scheduling over one shared store.
#[derive(Clone)]
pub struct DaycareService {
    store: Arc<dyn EntityStore>,
}

impl DaycareService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub fn matcher(&self) -> AvailabilityMatcher<'_> {
        AvailabilityMatcher::new(self.store.as_ref())
    }

    pub fn schedules(&self) -> ScheduleManager<'_> {
        ScheduleManager::new(self.store.as_ref())
    }

    pub fn save_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let saved = self.store.save_customer(customer)?;
        info!(customer_id = saved.id, "customer saved");
        Ok(saved)
    }

    pub fn customer(&self, id: Id) -> StoreResult<Customer> {
        self.store.find_customer(id)
    }

    pub fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        self.store.all_customers()
    }

    pub fn owner_of_pet(&self, pet_id: Id) -> StoreResult<Customer> {
        self.store.owner_of_pet(pet_id)
    }

    pub fn save_pet(&self, pet: NewPet) -> StoreResult<Pet> {
        let saved = self.store.save_pet(pet)?;
        info!(pet_id = saved.id, owner_id = saved.owner_id, "pet saved");
        Ok(saved)
    }

    pub fn pet(&self, id: Id) -> StoreResult<Pet> {
        self.store.find_pet(id)
    }

    pub fn all_pets(&self) -> StoreResult<Vec<Pet>> {
        self.store.all_pets()
    }

    pub fn pets_by_owner(&self, customer_id: Id) -> StoreResult<Vec<Pet>> {
        self.store.pets_by_owner(customer_id)
    }

    pub fn save_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let saved = self.store.save_employee(employee)?;
        info!(employee_id = saved.id, "employee saved");
        Ok(saved)
    }

    pub fn employee(&self, id: Id) -> StoreResult<Employee> {
        self.store.find_employee(id)
    }

    pub fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        self.store.all_employees()
    }

    /// Replaces the employee's availability; existing schedules are untouched.
    pub fn set_availability(&self, employee_id: Id, days: HashSet<Weekday>) -> StoreResult<Employee> {
        let updated = self.store.update_employee_availability(employee_id, days)?;
        info!(employee_id, days = updated.days_available.len(), "availability updated");
        Ok(updated)
    }

    /// Replaces the employee's skills; existing schedules are untouched.
    pub fn set_skills(&self, employee_id: Id, skills: BTreeSet<EmployeeSkill>) -> StoreResult<Employee> {
        let updated = self.store.update_employee_skills(employee_id, skills)?;
        info!(employee_id, skills = updated.skills.len(), "skills updated");
        Ok(updated)
    }

    pub fn find_qualified_employees(
        &self,
        skills: &BTreeSet<EmployeeSkill>,
        date: NaiveDate,
    ) -> StoreResult<Vec<Employee>> {
        self.matcher().find_qualified_employees(skills, date)
    }

    pub fn create_schedule(
        &self,
        pet_ids: Vec<Id>,
        employee_ids: Vec<Id>,
        date: NaiveDate,
        activities: BTreeSet<EmployeeSkill>,
    ) -> StoreResult<Schedule> {
        self.schedules()
            .create_schedule(pet_ids, employee_ids, date, activities)
    }

    pub fn all_schedules(&self) -> StoreResult<Vec<Schedule>> {
        self.schedules().all_schedules()
    }

    pub fn schedules_for_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>> {
        self.schedules().schedules_for_employee(employee_id)
    }

    pub fn schedules_for_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>> {
        self.schedules().schedules_for_pet(pet_id)
    }

    pub fn schedules_for_customer(&self, customer_id: Id) -> StoreResult<Vec<Schedule>> {
        self.schedules().schedules_for_customer(customer_id)
    }
}
