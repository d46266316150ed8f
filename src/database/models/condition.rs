use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Condition {
    pub id: i64,
    pub animal_id: i64,
    pub condition_type: String,
    pub is_enabled: bool,
    pub created: DateTime<Utc>,
    pub created_by_user_id: i64,
    pub updated: DateTime<Utc>,
    pub updated_by_user_id: i64,
}
