use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::Utc;
use sqlx::PgConnection;

use crate::database::models::{Event, EventCreate};
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::{current_user, Pagination};

/// Events joined with the owning animal's name
pub(crate) const EVENT_SELECT: &str = "SELECT e.id, e.latitude, e.longitude, e.animal_id, a.name AS animal_name, \
     e.event_type, e.trip_id, e.created, e.created_by_user_id, e.updated \
     FROM events e JOIN animals a ON a.id = e.animal_id";

/// GET /events/count
pub async fn count(mut session: TenantSession) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
        .fetch_one(session.connection())
        .await?;

    Ok(ApiResponse::success(count))
}

/// GET /events
pub async fn list(mut session: TenantSession, Query(pagination): Query<Pagination>) -> ApiResult<Vec<Event>> {
    let pagination = pagination.validated()?;

    let events = sqlx::query_as::<_, Event>(&format!("{} ORDER BY e.id LIMIT $1 OFFSET $2", EVENT_SELECT))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(session.connection())
        .await?;

    Ok(ApiResponse::success(events))
}

/// GET /events/:id
pub async fn get(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<Event> {
    let event = find_event(session.connection(), id).await?;
    Ok(ApiResponse::success(event))
}

/// POST /events
pub async fn create(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EventCreate>,
) -> ApiResult<Event> {
    let user = current_user(&mut session, &auth).await?;

    let animal_exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM animals WHERE id = $1")
        .bind(body.animal_id)
        .fetch_optional(session.connection())
        .await?;
    if animal_exists.is_none() {
        return Err(ApiError::not_found(format!("animal with id {} was not found", body.animal_id)));
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO events
             (latitude, longitude, event_type, animal_id, created, created_by_user_id, updated, updated_by_user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $5, $6)
         RETURNING id",
    )
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(body.event_type.as_str())
    .bind(body.animal_id)
    .bind(Utc::now())
    .bind(user.id)
    .fetch_one(session.connection())
    .await?;

    tracing::debug!("Recorded {} event {} for animal {}", body.event_type, id, body.animal_id);

    let event = find_event(session.connection(), id).await?;
    Ok(ApiResponse::created(event))
}

/// DELETE /events/:id
pub async fn delete(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<()> {
    let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(session.connection())
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(event_not_found(id));
    }

    Ok(ApiResponse::no_content())
}

fn event_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("event with id {} was not found", id))
}

async fn find_event(conn: &mut PgConnection, id: i64) -> Result<Event, ApiError> {
    sqlx::query_as::<_, Event>(&format!("{} WHERE e.id = $1", EVENT_SELECT))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| event_not_found(id))
}
