use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub created: DateTime<Utc>,
    pub created_by_user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationCreate {
    pub title: String,
    pub message: String,
}

/// A browser push subscription registered by a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationSubscription {
    pub id: i64,
    pub endpoint: String,
    pub public_key: String,
    pub authentication_secret: String,
    pub created_by_user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSubscriptionWrite {
    pub endpoint: String,
    pub public_key: String,
    pub authentication_secret: String,
}
