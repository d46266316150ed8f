use axum::{extract::State, Form};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{generate_jwt, hash_password, validate_jwt, Claims};
use crate::database::{repository, TenantSession};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub email_address: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmation {
    pub token: String,
    pub new_password: String,
    pub new_password_repeated: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub success: bool,
}

/// POST /auth/reset-password - Mail a password reset link
///
/// The link carries a one-day token that is also stored on the user so that
/// it can be redeemed only once.
pub async fn reset_password(
    State(state): State<AppState>,
    mut session: TenantSession,
    Form(form): Form<PasswordResetForm>,
) -> ApiResult<PasswordResetResponse> {
    let email_address = form.email_address.trim();

    let Some(user) = repository::find_user_by_email(session.connection(), email_address).await? else {
        tracing::info!("Password reset requested for unknown address {}", email_address);
        return Ok(ApiResponse::success(PasswordResetResponse { success: false }));
    };

    let claims = Claims::new(&user.email_address, session.tenant(), Duration::days(1));
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    sqlx::query("UPDATE users SET password_reset_token = $1, updated = $2 WHERE id = $3")
        .bind(&token)
        .bind(Utc::now())
        .bind(user.id)
        .execute(session.connection())
        .await?;

    let link = reset_link(&state.config.mail.client_base_url, &token);
    let success = state
        .mail
        .try_send_email(
            &user.email_address,
            "Reset your password",
            &format!(
                "Click the following link to finish resetting your password: <a href=\"{0}\">{0}</a>",
                link
            ),
        )
        .await;

    Ok(ApiResponse::success(PasswordResetResponse { success }))
}

/// POST /auth/confirm-password-reset - Redeem a reset token
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    mut session: TenantSession,
    Form(form): Form<PasswordResetConfirmation>,
) -> ApiResult<PasswordResetResponse> {
    if form.new_password != form.new_password_repeated {
        return Err(ApiError::bad_request("Passwords must match"));
    }

    let user = repository::find_user_by_reset_token(session.connection(), &form.token)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let claims = validate_jwt(&form.token, &state.config.security.jwt_secret)?;
    if claims.sub != user.email_address || claims.tenant != session.tenant() {
        return Err(ApiError::invalid_credentials());
    }

    let password_hash = hash_password(&form.new_password, state.config.security.bcrypt_cost).await?;

    sqlx::query(
        "UPDATE users SET password_hash = $1, password_reset_token = NULL, updated = $2 WHERE id = $3",
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user.id)
    .execute(session.connection())
    .await?;

    tracing::info!("Password reset completed for {}", user.email_address);
    Ok(ApiResponse::success(PasswordResetResponse { success: true }))
}

fn reset_link(client_base_url: &str, token: &str) -> String {
    format!(
        "{}/confirm-password-reset?token={}",
        client_base_url.trim_end_matches('/'),
        token
    )
}
