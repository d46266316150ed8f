use axum::{extract::Path, Extension, Json};
use chrono::Utc;
use sqlx::PgConnection;

use crate::database::models::{Note, NoteWrite};
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::current_user;

const NOTE_SELECT: &str = "SELECT n.id, n.animal_id, n.text, n.created, \
     c.first_name || ' ' || c.last_name AS created_by_user_name, n.updated, \
     u.first_name || ' ' || u.last_name AS updated_by_user_name \
     FROM notes n \
     JOIN users c ON c.id = n.created_by_user_id \
     JOIN users u ON u.id = n.updated_by_user_id";

/// GET /animals/note
pub async fn list(mut session: TenantSession) -> ApiResult<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(&format!("{} ORDER BY n.id", NOTE_SELECT))
        .fetch_all(session.connection())
        .await?;

    Ok(ApiResponse::success(notes))
}

/// POST /animals/note
pub async fn create(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NoteWrite>,
) -> ApiResult<Note> {
    let user = current_user(&mut session, &auth).await?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO notes (animal_id, text, created, created_by_user_id, updated, updated_by_user_id)
         VALUES ($1, $2, $3, $4, $3, $4)
         RETURNING id",
    )
    .bind(body.animal_id)
    .bind(&body.text)
    .bind(Utc::now())
    .bind(user.id)
    .fetch_one(session.connection())
    .await?;

    let note = find_note(session.connection(), id).await?;
    Ok(ApiResponse::created(note))
}

/// PUT /animals/note/:id - only the text is editable
pub async fn update(
    mut session: TenantSession,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<NoteWrite>,
) -> ApiResult<Note> {
    let user = current_user(&mut session, &auth).await?;

    let updated = sqlx::query("UPDATE notes SET text = $1, updated = $2, updated_by_user_id = $3 WHERE id = $4")
        .bind(&body.text)
        .bind(Utc::now())
        .bind(user.id)
        .bind(id)
        .execute(session.connection())
        .await?;

    if updated.rows_affected() == 0 {
        return Err(note_not_found(id));
    }

    let note = find_note(session.connection(), id).await?;
    Ok(ApiResponse::success(note))
}

/// DELETE /animals/note/:id
pub async fn delete(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<()> {
    let deleted = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(session.connection())
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(note_not_found(id));
    }

    Ok(ApiResponse::no_content())
}

fn note_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("note with id {} was not found", id))
}

async fn find_note(conn: &mut PgConnection, id: i64) -> Result<Note, ApiError> {
    sqlx::query_as::<_, Note>(&format!("{} WHERE n.id = $1", NOTE_SELECT))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| note_not_found(id))
}
