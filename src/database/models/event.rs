use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Kinds of events an animal can be tracked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Eat,
    Pee,
    Poo,
    #[serde(rename = "Fish oil")]
    FishOil,
    #[serde(rename = "Vitamin B")]
    VitaminB,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Eat => "Eat",
            EventType::Pee => "Pee",
            EventType::Poo => "Poo",
            EventType::FishOil => "Fish oil",
            EventType::VitaminB => "Vitamin B",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event row joined with the owning animal's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub animal_id: i64,
    pub animal_name: String,
    pub event_type: String,
    pub trip_id: Option<i64>,
    pub created: DateTime<Utc>,
    pub created_by_user_id: Option<i64>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCreate {
    pub latitude: f64,
    pub longitude: f64,
    pub animal_id: i64,
    pub event_type: EventType,
}
