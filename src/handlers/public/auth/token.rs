use axum::{extract::State, Form, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::database::{repository, TenantSession};
use crate::error::ApiError;

/// OAuth2 password-grant style form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// OAuth2 token response, returned bare rather than in the success envelope
/// so password-flow clients find `access_token` at the top level.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl LoginResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// POST /auth/token - Authenticate user and receive JWT token
///
/// `username` is the user's email address. The token is bound to the tenant
/// the request resolved to.
pub async fn login(
    State(state): State<AppState>,
    mut session: TenantSession,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email_address = form.username.trim();

    let Some(user) = repository::find_user_by_email(session.connection(), email_address).await? else {
        tracing::warn!(
            "Someone attempted to log in with username {} but no user with this username exists",
            email_address
        );
        return Err(ApiError::invalid_credentials());
    };

    if !verify_password(&form.password, &user.password_hash).await? {
        tracing::warn!(
            "Someone attempted to log in with username {} but supplied invalid credentials",
            email_address
        );
        return Err(ApiError::invalid_credentials());
    }

    if user.is_disabled {
        tracing::warn!("Disabled user {} attempted to log in", email_address);
        return Err(ApiError::invalid_credentials());
    }

    let lifetime = Duration::hours(state.config.security.jwt_expiry_hours as i64);
    let claims = Claims::new(&user.email_address, session.tenant(), lifetime);
    let access_token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    tracing::info!("User {} logged in to tenant '{}'", user.email_address, session.tenant());

    Ok(Json(LoginResponse::bearer(access_token)))
}
