use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub created_by_user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripCreate {
    pub event_ids: Vec<i64>,
}
