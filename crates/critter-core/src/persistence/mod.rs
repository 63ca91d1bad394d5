use crate::model::{
    Customer, Employee, EmployeeSkill, EntityKind, Id, NewCustomer, NewEmployee, NewPet,
    NewSchedule, Pet, Schedule,
};
use chrono::Weekday;
use std::collections::{BTreeSet, HashSet};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Id },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: Id) -> Self {
        StoreError::NotFound { kind, id }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Unavailable(format!("serialization error: {value}"))
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        Self::Unavailable(format!("io error: {value}"))
    }
}

impl From<csv::Error> for StoreError {
    fn from(value: csv::Error) -> Self {
        Self::Unavailable(format!("csv error: {value}"))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Unavailable(format!("sqlite error: {value}"))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable records for customers, pets, employees and schedules.
///
/// Every listing comes back in creation order. Lookups by id fail with
/// [`StoreError::NotFound`]. `save_schedule` is atomic: either the schedule
/// and all of its employee/pet links become visible, or nothing does.
pub trait EntityStore: Send + Sync {
    fn save_customer(&self, customer: NewCustomer) -> StoreResult<Customer>;
    fn find_customer(&self, id: Id) -> StoreResult<Customer>;
    fn all_customers(&self) -> StoreResult<Vec<Customer>>;
    fn owner_of_pet(&self, pet_id: Id) -> StoreResult<Customer>;

    /// Fails with `NotFound` when the owner does not exist.
    fn save_pet(&self, pet: NewPet) -> StoreResult<Pet>;
    fn find_pet(&self, id: Id) -> StoreResult<Pet>;
    fn all_pets(&self) -> StoreResult<Vec<Pet>>;
    fn pets_by_owner(&self, customer_id: Id) -> StoreResult<Vec<Pet>>;

    fn save_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;
    fn find_employee(&self, id: Id) -> StoreResult<Employee>;
    fn all_employees(&self) -> StoreResult<Vec<Employee>>;
    fn update_employee_availability(
        &self,
        id: Id,
        days: HashSet<Weekday>,
    ) -> StoreResult<Employee>;
    fn update_employee_skills(
        &self,
        id: Id,
        skills: BTreeSet<EmployeeSkill>,
    ) -> StoreResult<Employee>;

    /// Fails with `NotFound` when any referenced pet or employee does not exist.
    fn save_schedule(&self, schedule: NewSchedule) -> StoreResult<Schedule>;
    fn find_schedule(&self, id: Id) -> StoreResult<Schedule>;
    fn all_schedules(&self) -> StoreResult<Vec<Schedule>>;
    fn schedules_by_employee(&self, employee_id: Id) -> StoreResult<Vec<Schedule>>;
    fn schedules_by_pet(&self, pet_id: Id) -> StoreResult<Vec<Schedule>>;
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{export_schedules_to_csv, load_snapshot_from_json, save_snapshot_to_json};
pub use memory::{MemoryStore, StoreSnapshot};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
