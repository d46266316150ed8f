use sqlx::PgConnection;

use crate::database::manager::DatabaseError;
use crate::database::models::user::User;

const USER_COLUMNS: &str = "id, first_name, last_name, email_address, password_hash, password_reset_token, \
     is_disabled, created, updated";

/// Find a user in the tenant database by email address
pub async fn find_user_by_email(conn: &mut PgConnection, email_address: &str) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email_address = $1", USER_COLUMNS))
        .bind(email_address)
        .fetch_optional(conn)
        .await?;

    Ok(user)
}

/// Find the user holding a pending password reset token
pub async fn find_user_by_reset_token(conn: &mut PgConnection, token: &str) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE password_reset_token = $1",
        USER_COLUMNS
    ))
    .bind(token)
    .fetch_optional(conn)
    .await?;

    Ok(user)
}

pub async fn list_users(conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<User>, DatabaseError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok(users)
}

/// Users other than the excluded ones, used for notification fan-out
pub async fn list_users_except(conn: &mut PgConnection, exclude_user_ids: &[i64]) -> Result<Vec<User>, DatabaseError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE NOT (id = ANY($1)) ORDER BY id",
        USER_COLUMNS
    ))
    .bind(exclude_user_ids)
    .fetch_all(conn)
    .await?;

    Ok(users)
}

/// Count users holding the given email address
pub async fn count_users_by_email(conn: &mut PgConnection, email_address: &str) -> Result<i64, DatabaseError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email_address = $1")
        .bind(email_address)
        .fetch_one(conn)
        .await?;

    Ok(count.0)
}
