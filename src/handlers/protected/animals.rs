use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{Connection, PgConnection};
use std::collections::HashMap;

use crate::database::models::{Animal, AnimalWrite, Condition, Event};
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::{current_user, default_page_size, events::EVENT_SELECT, Pagination};

const ANIMAL_COLUMNS: &str =
    "id, name, is_deactivated, created, created_by_user_id, updated, updated_by_user_id";

const CONDITION_COLUMNS: &str = "id, animal_id, condition_type, is_enabled, created, created_by_user_id, \
     updated, updated_by_user_id";

#[derive(Debug, Deserialize)]
pub struct AnimalListParams {
    #[serde(default)]
    pub include_deactivated: bool,
    #[serde(default)]
    pub include_events: bool,
    #[serde(default)]
    pub include_conditions: bool,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// GET /animals/count
pub async fn count(mut session: TenantSession) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM animals")
        .fetch_one(session.connection())
        .await?;

    Ok(ApiResponse::success(count))
}

/// GET /animals
pub async fn list(mut session: TenantSession, Query(params): Query<AnimalListParams>) -> ApiResult<Vec<Animal>> {
    let pagination = Pagination::new(params.page, params.page_size)?;

    let mut animals = sqlx::query_as::<_, Animal>(&format!(
        "SELECT {} FROM animals WHERE $1 OR NOT is_deactivated ORDER BY id LIMIT $2 OFFSET $3",
        ANIMAL_COLUMNS
    ))
    .bind(params.include_deactivated)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(session.connection())
    .await?;

    load_details(
        session.connection(),
        &mut animals,
        params.include_events,
        params.include_conditions,
    )
    .await?;

    Ok(ApiResponse::success(animals))
}

/// GET /animals/:id
pub async fn get(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<Animal> {
    let animal = find_animal(session.connection(), id, true).await?;
    Ok(ApiResponse::success(animal))
}

/// POST /animals
pub async fn create(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AnimalWrite>,
) -> ApiResult<Animal> {
    let user = current_user(&mut session, &auth).await?;
    let body = body.normalized();
    let now = Utc::now();

    let mut tx = session.connection().begin().await?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO animals (name, is_deactivated, created, created_by_user_id, updated, updated_by_user_id)
         VALUES ($1, $2, $3, $4, $3, $4)
         RETURNING id",
    )
    .bind(&body.name)
    .bind(body.is_deactivated.unwrap_or(false))
    .bind(now)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    replace_tracked_types(&mut *tx, id, &body, user.id).await?;
    tx.commit().await?;

    tracing::info!("User {} created animal {} ({})", user.email_address, id, body.name);

    let animal = find_animal(session.connection(), id, false).await?;
    Ok(ApiResponse::created(animal))
}

/// PUT /animals/:id - replace fields and tracked types
pub async fn update(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<AnimalWrite>,
) -> ApiResult<Animal> {
    let user = current_user(&mut session, &auth).await?;
    let body = body.normalized();

    let mut tx = session.connection().begin().await?;

    let updated = sqlx::query(
        "UPDATE animals SET name = $1, is_deactivated = $2, updated = $3, updated_by_user_id = $4 WHERE id = $5",
    )
    .bind(&body.name)
    .bind(body.is_deactivated.unwrap_or(false))
    .bind(Utc::now())
    .bind(user.id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(animal_not_found(id));
    }

    replace_tracked_types(&mut *tx, id, &body, user.id).await?;
    tx.commit().await?;

    let animal = find_animal(session.connection(), id, false).await?;
    Ok(ApiResponse::success(animal))
}

/// DELETE /animals/:id
pub async fn delete(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<()> {
    let deleted = sqlx::query("DELETE FROM animals WHERE id = $1")
        .bind(id)
        .execute(session.connection())
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(animal_not_found(id));
    }

    Ok(ApiResponse::no_content())
}

/// PUT /animals/:id/:condition_type - flip a condition, enabling it if the
/// animal never had it
pub async fn toggle_condition(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Path((id, condition_type)): Path<(i64, String)>,
) -> ApiResult<Animal> {
    let user = current_user(&mut session, &auth).await?;
    let condition_type = condition_type.trim();
    if condition_type.is_empty() {
        return Err(ApiError::bad_request("condition_type must not be empty"));
    }

    // 404 before touching conditions
    find_animal(session.connection(), id, false).await?;

    sqlx::query(
        "INSERT INTO conditions
             (animal_id, condition_type, is_enabled, created, created_by_user_id, updated, updated_by_user_id)
         VALUES ($1, $2, TRUE, $3, $4, $3, $4)
         ON CONFLICT (animal_id, condition_type) DO UPDATE
         SET is_enabled = NOT conditions.is_enabled,
             updated = EXCLUDED.updated,
             updated_by_user_id = EXCLUDED.updated_by_user_id",
    )
    .bind(id)
    .bind(condition_type)
    .bind(Utc::now())
    .bind(user.id)
    .execute(session.connection())
    .await?;

    let mut animal = find_animal(session.connection(), id, false).await?;
    animal.conditions = Some(conditions_for(session.connection(), &[id]).await?.remove(&id).unwrap_or_default());

    Ok(ApiResponse::success(animal))
}

fn animal_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("animal with id {} was not found", id))
}

/// Load one animal with its tracked types, optionally with events and
/// conditions as well.
async fn find_animal(conn: &mut PgConnection, id: i64, with_details: bool) -> Result<Animal, ApiError> {
    let animal = sqlx::query_as::<_, Animal>(&format!("SELECT {} FROM animals WHERE id = $1", ANIMAL_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| animal_not_found(id))?;

    let mut animals = vec![animal];
    load_details(conn, &mut animals, with_details, with_details).await?;

    animals.pop().ok_or_else(|| animal_not_found(id))
}

/// Fill tracked types (always) and events/conditions (on request) for a page
/// of animals with one query per relation.
async fn load_details(
    conn: &mut PgConnection,
    animals: &mut [Animal],
    include_events: bool,
    include_conditions: bool,
) -> Result<(), ApiError> {
    if animals.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = animals.iter().map(|a| a.id).collect();

    let mut event_types = group_by_animal(
        sqlx::query_as::<_, (i64, String)>(
            "SELECT animal_id, event_type FROM animal_event_types WHERE animal_id = ANY($1) ORDER BY created, event_type",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?,
    );

    let mut condition_types = group_by_animal(
        sqlx::query_as::<_, (i64, String)>(
            "SELECT animal_id, condition_type FROM animal_condition_types WHERE animal_id = ANY($1) \
             ORDER BY created, condition_type",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?,
    );

    let mut events = if include_events {
        let rows = sqlx::query_as::<_, Event>(&format!("{} WHERE e.animal_id = ANY($1) ORDER BY e.id", EVENT_SELECT))
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
        let mut grouped: HashMap<i64, Vec<Event>> = HashMap::new();
        for event in rows {
            grouped.entry(event.animal_id).or_default().push(event);
        }
        Some(grouped)
    } else {
        None
    };

    let mut conditions = if include_conditions {
        Some(conditions_for(conn, &ids).await?)
    } else {
        None
    };

    for animal in animals.iter_mut() {
        animal.event_types_to_track = event_types.remove(&animal.id).unwrap_or_default();
        animal.condition_types_to_track = condition_types.remove(&animal.id).unwrap_or_default();
        if let Some(events) = events.as_mut() {
            animal.events = Some(events.remove(&animal.id).unwrap_or_default());
        }
        if let Some(conditions) = conditions.as_mut() {
            animal.conditions = Some(conditions.remove(&animal.id).unwrap_or_default());
        }
    }

    Ok(())
}

async fn conditions_for(conn: &mut PgConnection, ids: &[i64]) -> Result<HashMap<i64, Vec<Condition>>, ApiError> {
    let rows = sqlx::query_as::<_, Condition>(&format!(
        "SELECT {} FROM conditions WHERE animal_id = ANY($1) ORDER BY id",
        CONDITION_COLUMNS
    ))
    .bind(ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<i64, Vec<Condition>> = HashMap::new();
    for condition in rows {
        grouped.entry(condition.animal_id).or_default().push(condition);
    }
    Ok(grouped)
}

fn group_by_animal(rows: Vec<(i64, String)>) -> HashMap<i64, Vec<String>> {
    let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
    for (animal_id, value) in rows {
        grouped.entry(animal_id).or_default().push(value);
    }
    grouped
}

async fn replace_tracked_types(
    conn: &mut PgConnection,
    animal_id: i64,
    body: &AnimalWrite,
    user_id: i64,
) -> Result<(), ApiError> {
    let now = Utc::now();

    sqlx::query("DELETE FROM animal_event_types WHERE animal_id = $1")
        .bind(animal_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM animal_condition_types WHERE animal_id = $1")
        .bind(animal_id)
        .execute(&mut *conn)
        .await?;

    for event_type in &body.event_types_to_track {
        sqlx::query(
            "INSERT INTO animal_event_types
                 (animal_id, event_type, created, created_by_user_id, updated, updated_by_user_id)
             VALUES ($1, $2, $3, $4, $3, $4)",
        )
        .bind(animal_id)
        .bind(event_type.as_str())
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    for condition_type in &body.condition_types_to_track {
        sqlx::query(
            "INSERT INTO animal_condition_types
                 (animal_id, condition_type, created, created_by_user_id, updated, updated_by_user_id)
             VALUES ($1, $2, $3, $4, $3, $4)",
        )
        .bind(animal_id)
        .bind(condition_type)
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
