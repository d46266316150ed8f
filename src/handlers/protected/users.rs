use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::{User, UserCreate};
use crate::database::{repository, TenantSession};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::Pagination;

/// GET /users
pub async fn list(mut session: TenantSession, Query(pagination): Query<Pagination>) -> ApiResult<Vec<User>> {
    let pagination = pagination.validated()?;
    let users = repository::list_users(session.connection(), pagination.limit(), pagination.offset()).await?;
    Ok(ApiResponse::success(users))
}

/// POST /users
pub async fn create(
    State(state): State<AppState>,
    mut session: TenantSession,
    Json(body): Json<UserCreate>,
) -> ApiResult<User> {
    if body.password != body.password_repeated {
        return Err(ApiError::bad_request("Passwords must match"));
    }

    let email_address = body.email_address.trim();
    if repository::count_users_by_email(session.connection(), email_address).await? > 0 {
        return Err(ApiError::conflict(format!("A user with email address {} already exists", email_address)));
    }

    let password_hash = hash_password(&body.password, state.config.security.bcrypt_cost).await?;
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (first_name, last_name, email_address, password_hash, is_disabled, created, updated)
         VALUES ($1, $2, $3, $4, FALSE, $5, $5)",
    )
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(email_address)
    .bind(password_hash)
    .bind(now)
    .execute(session.connection())
    .await?;

    let user = repository::find_user_by_email(session.connection(), email_address)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Created user could not be read back"))?;

    tracing::info!("Created user {} in tenant '{}'", user.email_address, session.tenant());
    Ok(ApiResponse::created(user))
}

/// DELETE /users/:id
pub async fn delete(mut session: TenantSession, Path(id): Path<i64>) -> ApiResult<()> {
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(session.connection())
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("user with id {} was not found", id)));
    }

    Ok(ApiResponse::no_content())
}
