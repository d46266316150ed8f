use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};
use sqlx::PgConnection;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::PushConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::{Notification, NotificationSubscription, User};
use crate::database::repository;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push gateway is not configured")]
    NotConfigured,

    #[error("Push gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Delivers web-push messages by handing them to an external push gateway,
/// which performs the VAPID signing and payload encryption.
#[derive(Clone)]
pub struct PushService {
    client: reqwest::Client,
    config: PushConfig,
}

const SUBSCRIPTION_COLUMNS: &str = "id, endpoint, public_key, authentication_secret, created_by_user_id";

impl PushService {
    pub fn new(config: PushConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.gateway_url.is_some()
    }

    pub async fn send_to_subscription(
        &self,
        subscription: &NotificationSubscription,
        title: &str,
        message: &str,
    ) -> Result<bool, PushError> {
        let gateway = self.config.gateway_url.as_deref().ok_or(PushError::NotConfigured)?;

        let response = self
            .client
            .post(gateway)
            .json(&self.payload(subscription, title, message))
            .send()
            .await?;

        if !response.status().is_success() {
            error!(
                "Push notification to subscription {} could not be sent: {}",
                subscription.id,
                response.status()
            );
            return Ok(false);
        }

        Ok(true)
    }

    /// Send to every subscription of one user. Returns how many were delivered.
    pub async fn send_to_user(
        &self,
        conn: &mut PgConnection,
        user: &User,
        title: &str,
        message: &str,
    ) -> Result<usize, DatabaseError> {
        let subscriptions = subscriptions_for_user(conn, user.id).await?;

        let results = join_all(
            subscriptions
                .iter()
                .map(|subscription| self.send_to_subscription(subscription, title, message)),
        )
        .await;

        let mut delivered = 0;
        for result in results {
            match result {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(e) => warn!("Push notification to user {} failed: {}", user.id, e),
            }
        }
        Ok(delivered)
    }

    /// Send to every user except the excluded ones
    pub async fn send_to_users(
        &self,
        conn: &mut PgConnection,
        title: &str,
        message: &str,
        exclude_user_ids: &[i64],
    ) -> Result<usize, DatabaseError> {
        let users = repository::list_users_except(conn, exclude_user_ids).await?;

        let mut delivered = 0;
        for user in &users {
            delivered += self.send_to_user(conn, user, title, message).await?;
        }

        info!("Delivered '{}' to {} subscriptions across {} users", title, delivered, users.len());
        Ok(delivered)
    }

    fn payload(&self, subscription: &NotificationSubscription, title: &str, message: &str) -> Value {
        json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": {
                    "p256dh": subscription.public_key,
                    "auth": subscription.authentication_secret
                }
            },
            "data": {
                "title": title,
                "message": message
            },
            "vapid": {
                "private_key": self.config.vapid_private_key,
                "claims": { "sub": self.config.vapid_subject }
            }
        })
    }
}

pub async fn subscriptions_for_user(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<Vec<NotificationSubscription>, DatabaseError> {
    let subscriptions = sqlx::query_as::<_, NotificationSubscription>(&format!(
        "SELECT {} FROM notification_subscriptions WHERE created_by_user_id = $1 ORDER BY id",
        SUBSCRIPTION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(subscriptions)
}

pub async fn find_subscription_by_endpoint(
    conn: &mut PgConnection,
    endpoint: &str,
) -> Result<Option<NotificationSubscription>, DatabaseError> {
    let subscription = sqlx::query_as::<_, NotificationSubscription>(&format!(
        "SELECT {} FROM notification_subscriptions WHERE endpoint = $1",
        SUBSCRIPTION_COLUMNS
    ))
    .bind(endpoint)
    .fetch_optional(conn)
    .await?;

    Ok(subscription)
}

/// Store a notification sent by `sender`
pub async fn record_notification(
    conn: &mut PgConnection,
    sender: &User,
    title: &str,
    message: &str,
) -> Result<Notification, DatabaseError> {
    let (id, created): (i64, chrono::DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO notifications (title, message, created, created_by_user_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id, created",
    )
    .bind(title)
    .bind(message)
    .bind(Utc::now())
    .bind(sender.id)
    .fetch_one(conn)
    .await?;

    Ok(Notification {
        id,
        title: title.to_string(),
        message: message.to_string(),
        created,
        created_by_user_name: sender.full_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> NotificationSubscription {
        NotificationSubscription {
            id: 7,
            endpoint: "https://push.example.com/abc".to_string(),
            public_key: "p256dh-key".to_string(),
            authentication_secret: "auth-secret".to_string(),
            created_by_user_id: 1,
        }
    }

    #[test]
    fn payload_carries_subscription_keys_and_vapid_claims() {
        let service = PushService::new(
            PushConfig {
                gateway_url: Some("http://gateway.local/send".to_string()),
                vapid_private_key: Some("vapid-key".to_string()),
                vapid_subject: "mailto:no-reply@pooper.online".to_string(),
            },
            reqwest::Client::new(),
        );

        let payload = service.payload(&subscription(), "Hello!", "World!");
        assert_eq!(payload["subscription"]["endpoint"], "https://push.example.com/abc");
        assert_eq!(payload["subscription"]["keys"]["p256dh"], "p256dh-key");
        assert_eq!(payload["subscription"]["keys"]["auth"], "auth-secret");
        assert_eq!(payload["data"], json!({ "title": "Hello!", "message": "World!" }));
        assert_eq!(payload["vapid"]["claims"]["sub"], "mailto:no-reply@pooper.online");
    }

    #[tokio::test]
    async fn unconfigured_gateway_is_an_error() {
        let service = PushService::new(PushConfig::default(), reqwest::Client::new());
        assert!(!service.is_configured());
        let result = service.send_to_subscription(&subscription(), "Hello!", "World!").await;
        assert!(matches!(result, Err(PushError::NotConfigured)));
    }
}
