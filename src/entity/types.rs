use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Event,
    Product,
    Date,
    Other,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Person => write!(f, "PERSON"),
            EntityType::Organization => write!(f, "ORGANIZATION"),
            EntityType::Location => write!(f, "LOCATION"),
            EntityType::Event => write!(f, "EVENT"),
            EntityType::Product => write!(f, "PRODUCT"),
            EntityType::Date => write!(f, "DATE"),
            EntityType::Other => write!(f, "OTHER"),
        }
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PERSON" | "LEADER" => EntityType::Person,
            "ORGANIZATION" | "ORG" => EntityType::Organization,
            "LOCATION" | "COUNTRY" | "GPE" => EntityType::Location,
            "EVENT" => EntityType::Event,
            "PRODUCT" => EntityType::Product,
            "DATE" => EntityType::Date,
            _ => EntityType::Other,
        }
    }
}

/// A named entity as reported by the external extractor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub entity_type: EntityType,
}

impl Entity {
    pub fn new(name: &str, entity_type: EntityType) -> Self {
        Entity {
            name: name.to_string(),
            entity_type,
        }
    }
}

/// Kind of geopolitical actor recognized by the gazetteer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActorKind {
    Country,
    Leader,
    Organization,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorKind::Country => write!(f, "COUNTRY"),
            ActorKind::Leader => write!(f, "LEADER"),
            ActorKind::Organization => write!(f, "ORGANIZATION"),
        }
    }
}

/// An entity resolved to its canonical actor name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub kind: ActorKind,
}
