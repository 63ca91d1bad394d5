use super::{Id, PetType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Id,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub name: String,
    /// Fixed when the pet is registered.
    pub owner_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub name: String,
    pub owner_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewPet {
    pub fn new(pet_type: PetType, name: impl Into<String>, owner_id: Id) -> Self {
        Self {
            pet_type,
            name: name.into(),
            owner_id,
            birth_date: None,
            notes: None,
        }
    }

    pub fn born_on(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub(crate) fn into_pet(self, id: Id) -> Pet {
        Pet {
            id,
            pet_type: self.pet_type,
            name: self.name,
            owner_id: self.owner_id,
            birth_date: self.birth_date,
            notes: self.notes,
        }
    }
}
