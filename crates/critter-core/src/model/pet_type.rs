use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetType {
    Cat,
    Dog,
    #[serde(alias = "REPTILE")]
    Lizard,
    Bird,
    Fish,
    Snake,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pet type '{0}'")]
pub struct ParsePetTypeError(pub String);

impl PetType {
    pub const ALL: [PetType; 7] = [
        PetType::Cat,
        PetType::Dog,
        PetType::Lizard,
        PetType::Bird,
        PetType::Fish,
        PetType::Snake,
        PetType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetType::Cat => "CAT",
            PetType::Dog => "DOG",
            PetType::Lizard => "LIZARD",
            PetType::Bird => "BIRD",
            PetType::Fish => "FISH",
            PetType::Snake => "SNAKE",
            PetType::Other => "OTHER",
        }
    }
}

impl fmt::Display for PetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetType {
    type Err = ParsePetTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized == "REPTILE" {
            return Ok(PetType::Lizard);
        }
        PetType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParsePetTypeError(s.to_string()))
    }
}
