use axum::{Extension, Json};
use chrono::Utc;
use sqlx::Connection;

use crate::database::models::{Trip, TripCreate};
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::current_user;

/// GET /trips
pub async fn list(mut session: TenantSession) -> ApiResult<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>("SELECT id, created, created_by_user_id FROM trips ORDER BY id")
        .fetch_all(session.connection())
        .await?;

    Ok(ApiResponse::success(trips))
}

/// POST /trips - group existing events into a new trip. Either every listed
/// event is attached or nothing is written.
pub async fn create(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<TripCreate>,
) -> ApiResult<Trip> {
    let user = current_user(&mut session, &auth).await?;

    let mut event_ids = body.event_ids;
    event_ids.sort_unstable();
    event_ids.dedup();

    let now = Utc::now();
    let mut tx = session.connection().begin().await?;

    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (created, created_by_user_id) VALUES ($1, $2) RETURNING id, created, created_by_user_id",
    )
    .bind(now)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    let attached = sqlx::query(
        "UPDATE events SET trip_id = $1, updated = $2, updated_by_user_id = $3 WHERE id = ANY($4)",
    )
    .bind(trip.id)
    .bind(now)
    .bind(user.id)
    .bind(&event_ids)
    .execute(&mut *tx)
    .await?;

    if attached.rows_affected() != event_ids.len() as u64 {
        return Err(ApiError::not_found("One or more events were not found"));
    }

    tx.commit().await?;

    tracing::info!("User {} created trip {} with {} events", user.email_address, trip.id, event_ids.len());
    Ok(ApiResponse::created(trip))
}
