use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::{
    Notification, NotificationCreate, NotificationSubscription, NotificationSubscriptionWrite,
};
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::notification_service::{
    find_subscription_by_endpoint, record_notification, subscriptions_for_user,
};
use crate::services::PushService;

use super::current_user;

#[derive(Debug, Serialize)]
pub struct Delivery {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct Broadcast {
    #[serde(flatten)]
    pub notification: Notification,
    pub delivered: usize,
}

/// POST /notifications/subscribe - register a browser push subscription
pub async fn subscribe(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NotificationSubscriptionWrite>,
) -> ApiResult<NotificationSubscription> {
    let user = current_user(&mut session, &auth).await?;

    if find_subscription_by_endpoint(session.connection(), &body.endpoint).await?.is_some() {
        return Err(ApiError::conflict("Subscription already exists"));
    }

    let subscription = sqlx::query_as::<_, NotificationSubscription>(
        "INSERT INTO notification_subscriptions
             (endpoint, public_key, authentication_secret, created, created_by_user_id, updated, updated_by_user_id)
         VALUES ($1, $2, $3, $4, $5, $4, $5)
         RETURNING id, endpoint, public_key, authentication_secret, created_by_user_id",
    )
    .bind(&body.endpoint)
    .bind(&body.public_key)
    .bind(&body.authentication_secret)
    .bind(Utc::now())
    .bind(user.id)
    .fetch_one(session.connection())
    .await?;

    Ok(ApiResponse::created(subscription))
}

/// PUT /notifications/subscribe - refresh the keys of a known endpoint
pub async fn resubscribe(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NotificationSubscriptionWrite>,
) -> ApiResult<NotificationSubscription> {
    let user = current_user(&mut session, &auth).await?;

    let subscription = sqlx::query_as::<_, NotificationSubscription>(
        "UPDATE notification_subscriptions
         SET public_key = $1, authentication_secret = $2, updated = $3, updated_by_user_id = $4
         WHERE endpoint = $5
         RETURNING id, endpoint, public_key, authentication_secret, created_by_user_id",
    )
    .bind(&body.public_key)
    .bind(&body.authentication_secret)
    .bind(Utc::now())
    .bind(user.id)
    .bind(&body.endpoint)
    .fetch_optional(session.connection())
    .await?
    .ok_or_else(|| ApiError::not_found("Subscription was not found"))?;

    Ok(ApiResponse::success(subscription))
}

/// GET /notifications/test - push a test message to the caller's first
/// subscription
pub async fn test(
    State(state): State<AppState>,
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Delivery> {
    require_gateway(&state.push)?;
    let user = current_user(&mut session, &auth).await?;

    let subscription = subscriptions_for_user(session.connection(), user.id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Subscription was not found"))?;

    let success = match state.push.send_to_subscription(&subscription, "Hello!", "World!").await {
        Ok(success) => success,
        Err(e) => {
            tracing::error!("Test notification for {} failed: {}", user.email_address, e);
            return Err(ApiError::bad_gateway("Push gateway request failed"));
        }
    };

    Ok(ApiResponse::success(Delivery { success }))
}

/// POST /notifications - record a notification and push it to everybody else
pub async fn broadcast(
    State(state): State<AppState>,
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NotificationCreate>,
) -> ApiResult<Broadcast> {
    require_gateway(&state.push)?;
    let user = current_user(&mut session, &auth).await?;

    let notification = record_notification(session.connection(), &user, &body.title, &body.message).await?;
    let delivered = state
        .push
        .send_to_users(session.connection(), &body.title, &body.message, &[user.id])
        .await?;

    Ok(ApiResponse::created(Broadcast { notification, delivered }))
}

/// Push routes refuse to run, and record nothing, without a gateway
fn require_gateway(push: &PushService) -> Result<(), ApiError> {
    if push.is_configured() {
        Ok(())
    } else {
        Err(ApiError::service_unavailable("Push notifications are not configured"))
    }
}
