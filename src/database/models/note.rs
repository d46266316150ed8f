use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Note row joined with the display names of its author and last editor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub animal_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub created_by_user_name: String,
    pub updated: DateTime<Utc>,
    pub updated_by_user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteWrite {
    pub animal_id: i64,
    pub text: String,
}
