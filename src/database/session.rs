use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres};
use std::ops::{Deref, DerefMut};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::ResolvedTenant;

/// A pooled connection to one tenant's database, owned by a single request.
///
/// Dropping the session hands the connection back to the tenant pool, so it
/// is released on every exit path of the handler that extracted it.
pub struct TenantSession {
    tenant: String,
    connection: PoolConnection<Postgres>,
}

impl TenantSession {
    pub(crate) fn new(tenant: &str, connection: PoolConnection<Postgres>) -> Self {
        Self {
            tenant: tenant.to_string(),
            connection,
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.connection
    }
}

impl Deref for TenantSession {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for TenantSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TenantSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ResolvedTenant(tenant) = parts
            .extensions
            .get::<ResolvedTenant>()
            .cloned()
            .ok_or_else(|| ApiError::internal_server_error("Tenant gate did not run for this route"))?;

        state.database.acquire(&tenant).await.map_err(|e| {
            tracing::error!("Failed to acquire session for tenant '{}': {}", tenant, e);
            e.into()
        })
    }
}
