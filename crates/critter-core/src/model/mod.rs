//! Entities of the daycare: customers own pets, employees hold skills and
//! weekly availability, schedules book pets and employees onto a date.

pub mod customer;
pub mod employee;
pub mod pet;
pub mod pet_type;
pub mod schedule;
pub mod skill;
pub mod weekdays;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use customer::{Customer, NewCustomer};
pub use employee::{Employee, NewEmployee};
pub use pet::{NewPet, Pet};
pub use pet_type::{ParsePetTypeError, PetType};
pub use schedule::{NewSchedule, Schedule};
pub use skill::{EmployeeSkill, ParseSkillError};

/// Store-assigned identifier, unique per entity kind and increasing in creation order.
pub type Id = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Pet,
    Employee,
    Schedule,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Pet => "pet",
            EntityKind::Employee => "employee",
            EntityKind::Schedule => "schedule",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
