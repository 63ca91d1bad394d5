use super::{EntityStore, StoreError, StoreResult};
use crate::model::{
    Customer, Employee, EmployeeSkill, EntityKind, Id, NewCustomer, NewEmployee, NewPet,
    NewSchedule, Pet, Schedule,
};
use chrono::Weekday;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Plain copy of every table, used for JSON snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub customers: Vec<Customer>,
    pub pets: Vec<Pet>,
    pub employees: Vec<Employee>,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Default)]
struct Sequences {
    customer: Id,
    pet: Id,
    employee: Id,
    schedule: Id,
}

fn next(sequence: &mut Id) -> Id {
    *sequence += 1;
    *sequence
}

fn link(index: &mut HashMap<Id, Vec<Id>>, key: Id, value: Id) {
    let entries = index.entry(key).or_default();
    if entries.last() != Some(&value) {
        entries.push(value);
    }
}

/// Entity tables keyed by id plus the relationship indexes. Ids grow
/// monotonically, so `BTreeMap` iteration and the index vectors are both in
/// creation order.
#[derive(Debug, Default)]
struct Tables {
    sequences: Sequences,
    customers: BTreeMap<Id, Customer>,
    pets: BTreeMap<Id, Pet>,
    employees: BTreeMap<Id, Employee>,
    schedules: BTreeMap<Id, Schedule>,
    pets_by_owner: HashMap<Id, Vec<Id>>,
    schedules_by_employee: HashMap<Id, Vec<Id>>,
    schedules_by_pet: HashMap<Id, Vec<Id>>,
}

impl Tables {
    fn customer(&self, id: Id) -> StoreResult<Customer> {
        let mut customer = self
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::Customer, id))?;
        customer.pet_ids = self.pets_by_owner.get(&id).cloned().unwrap_or_default();
        Ok(customer)
    }

    fn pet(&self, id: Id) -> StoreResult<Pet> {
        self.pets
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::Pet, id))
    }

    fn employee(&self, id: Id) -> StoreResult<Employee> {
        self.employees
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::Employee, id))
    }

    fn schedule(&self, id: Id) -> StoreResult<Schedule> {
        self.schedules
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::Schedule, id))
    }

    fn schedules_from_index(&self, index: &HashMap<Id, Vec<Id>>, key: Id) -> StoreResult<Vec<Schedule>> {
        index
            .get(&key)
            .map(|ids| ids.iter().map(|id| self.schedule(*id)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn insert_customer(&mut self, customer: Customer) {
        self.sequences.customer = self.sequences.customer.max(customer.id);
        self.customers.insert(customer.id, Customer { pet_ids: Vec::new(), ..customer });
    }

    fn insert_pet(&mut self, pet: Pet) {
        self.sequences.pet = self.sequences.pet.max(pet.id);
        link(&mut self.pets_by_owner, pet.owner_id, pet.id);
        self.pets.insert(pet.id, pet);
    }

    fn insert_employee(&mut self, employee: Employee) {
        self.sequences.employee = self.sequences.employee.max(employee.id);
        self.employees.insert(employee.id, employee);
    }

    fn insert_schedule(&mut self, schedule: Schedule) {
        self.sequences.schedule = self.sequences.schedule.max(schedule.id);
        for employee_id in &schedule.employee_ids {
            link(&mut self.schedules_by_employee, *employee_id, schedule.id);
        }
        for pet_id in &schedule.pet_ids {
            link(&mut self.schedules_by_pet, *pet_id, schedule.id);
        }
        self.schedules.insert(schedule.id, schedule);
    }
}

/// In-process store: an arena of entities per kind and id-based
/// relationship indexes, all behind one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read();
        StoreSnapshot {
            customers: tables
                .customers
                .keys()
                .filter_map(|id| tables.customer(*id).ok())
                .collect(),
            pets: tables.pets.values().cloned().collect(),
            employees: tables.employees.values().cloned().collect(),
            schedules: tables.schedules.values().cloned().collect(),
        }
    }

    /// Rebuilds a store from a snapshot. Records are re-inserted in id order,
    /// so a snapshot whose ids were written out of order still yields
    /// creation-ordered indexes. Dangling references are rejected.
    pub fn from_snapshot(mut snapshot: StoreSnapshot) -> StoreResult<Self> {
        snapshot.customers.sort_by_key(|c| c.id);
        snapshot.pets.sort_by_key(|p| p.id);
        snapshot.employees.sort_by_key(|e| e.id);
        snapshot.schedules.sort_by_key(|s| s.id);

        let mut tables = Tables::default();
        for customer in snapshot.customers {
            tables.insert_customer(customer);
        }
        for pet in snapshot.pets {
            if !tables.customers.contains_key(&pet.owner_id) {
                return Err(StoreError::unavailable(format!(
                    "snapshot pet {} references missing customer {}",
                    pet.id, pet.owner_id
                )));
            }
            tables.insert_pet(pet);
        }
        for employee in snapshot.employees {
            tables.insert_employee(employee);
        }
        for schedule in snapshot.schedules {
            let dangling_pet = schedule.pet_ids.iter().find(|id| !tables.pets.contains_key(id));
            let dangling_employee = schedule
                .employee_ids
                .iter()
                .find(|id| !tables.employees.contains_key(id));
            if dangling_pet.is_some() || dangling_employee.is_some() {
                return Err(StoreError::unavailable(format!(
                    "snapshot schedule {} references missing pets or employees",
                    schedule.id
                )));
            }
            tables.insert_schedule(schedule);
        }
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }
}

impl EntityStore for MemoryStore {
    fn save_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let mut tables = self.tables.write();
        let id = next(&mut tables.sequences.customer);
        let customer = customer.into_customer(id);
        tables.customers.insert(id, customer.clone());
        Ok(customer)
    }

    fn find_customer(&self, id: Id) -> StoreResult<Customer> {
        self.tables.read().customer(id)
    }

    fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        let tables = self.tables.read();
        tables.customers.keys().map(|id| tables.customer(*id)).collect()
    }

    fn owner_of_pet(&self, pet_id: Id) -> StoreResult<Customer> {
        let tables = self.tables.read();
        let pet = tables.pet(pet_id)?;
        tables.customer(pet.owner_id)
    }

    fn save_pet(&self, pet: NewPet) -> StoreResult<Pet> {
        let mut tables = self.tables.write();
        if !tables.customers.contains_key(&pet.owner_id) {
            return Err(StoreError::not_found(EntityKind::Customer, pet.owner_id));
        }
        let id = next(&mut tables.sequences.pet);
        let pet = pet.into_pet(id);
        tables.insert_pet(pet.clone());
        Ok(pet)
    }

    fn find_pet(&self, id: Id) -> StoreResult<Pet> {
        self.tables.read().pet(id)
    }

    fn all_pets(&self) -> StoreResult<Vec<Pet>> {
        Ok(self.tables.read().pets.values().cloned().collect())
    }

    fn pets_by_owner(&self, customer_id: Id) -> StoreResult<Vec<Pet>> {
        let tables = self.tables.read();
        if !tables.customers.contains_key(&customer_id) {
            return Err(StoreError::not_found(EntityKind::Customer, customer_id));
        }
        tables
            .pets_by_owner
            .get(&customer_id)
            .map(|ids| ids.iter().map(|id| tables.pet(*id)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn save_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut tables = self.tables.write();
        let id = next(&mut tables.sequences.employee);
        let employee = employee.into_employee(id);
        tables.employees.insert(id, employee.clone());
        Ok(employee)
    }

    fn find_employee(&self, id: Id) -> StoreResult<Employee> {
        self.tables.read().employee(id)
    }

    fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.tables.read().employees.values().cloned().collect())
    }

    fn update_employee_availability(
        &self,
        id: Id,
        days: HashSet<Weekday>,
    ) -> StoreResult<Employee> {
        let mut tables = self.tables.write();
        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Employee, id))?;
        employee.days_available = days;
        Ok(employee.clone())
    }

    fn update_employee_skills(
        &self,
        id: Id,
        skills: BTreeSet<EmployeeSkill>,
    ) -> StoreResult<Employee> {
        let mut tables = self.tables.write();
        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Employee, id))?;
        employee.skills = skills;
        Ok(employee.clone())
    }

    fn save_schedule(&self, schedule: NewSchedule) -> StoreResult<Schedule> {
        let mut tables = self.tables.write();
        // Check every reference before touching the sequence so a failure
        // leaves the tables exactly as they were.
        for pet_id in &schedule.pet_ids {
            tables.pet(*pet_id)?;
        }
        for employee_id in &schedule.employee_ids {
            tables.employee(*employee_id)?;
        }
        let id = next(&mut tables.sequences.schedule);
        let schedule = schedule.into_schedule(id);
        tables.insert_schedule(schedule.clone());
        Ok(schedule)
    }

    fn find_schedule(&self, id: Id) -> StoreResult<Schedule> {
        self.tables.read().schedule(id)
    }

    fn all_schedules(&self) -> StoreResult<Vec<Schedule>> {
        Ok(self.tables.read().schedules.values().cloned().collect())
    }

    fn schedules_by_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>> {
        let tables = self.tables.read();
        tables.employee(employee_id)?;
        tables.schedules_from_index(&tables.schedules_by_employee, employee_id)
    }

    fn schedules_by_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>> {
        let tables = self.tables.read();
        tables.pet(pet_id)?;
        tables.schedules_from_index(&tables.schedules_by_pet, pet_id)
    }
}
