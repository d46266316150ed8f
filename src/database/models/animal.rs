use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Condition, Event, EventType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Animal {
    pub id: i64,
    pub name: String,
    pub is_deactivated: bool,
    pub created: DateTime<Utc>,
    pub created_by_user_id: i64,
    pub updated: DateTime<Utc>,
    pub updated_by_user_id: i64,
    #[sqlx(skip)]
    pub event_types_to_track: Vec<String>,
    #[sqlx(skip)]
    pub condition_types_to_track: Vec<String>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

/// Body of POST /animals and PUT /animals/:id
#[derive(Debug, Clone, Deserialize)]
pub struct AnimalWrite {
    pub name: String,
    #[serde(default)]
    pub is_deactivated: Option<bool>,
    #[serde(default)]
    pub event_types_to_track: Vec<EventType>,
    #[serde(default)]
    pub condition_types_to_track: Vec<String>,
}

impl AnimalWrite {
    /// Tracked types with duplicates and blank condition names removed,
    /// keeping first-seen order.
    pub fn normalized(mut self) -> Self {
        let mut seen_events = Vec::new();
        self.event_types_to_track.retain(|t| {
            if seen_events.contains(t) {
                false
            } else {
                seen_events.push(*t);
                true
            }
        });

        let mut seen_conditions: Vec<String> = Vec::new();
        self.condition_types_to_track = self
            .condition_types_to_track
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| {
                if c.is_empty() || seen_conditions.contains(c) {
                    false
                } else {
                    seen_conditions.push(c.clone());
                    true
                }
            })
            .collect();

        self
    }
}
