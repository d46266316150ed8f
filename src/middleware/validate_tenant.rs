use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Tenant the request was resolved to, inserted by the tenant gate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTenant(pub String);

/// Tenant gate: resolves the tenant from host and headers and rejects the
/// request with 401 `{"reason": "Invalid tenant"}` unless it is allow-listed.
/// Rejected requests never reach the inner service; accepted ones carry a
/// `ResolvedTenant` extension and get the inner response back unchanged.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let tenant = state.tenants.resolve(request.uri(), request.headers());

    if !state.tenants.is_valid(&tenant).await {
        tracing::warn!("Rejected request for tenant '{}': not in allow-list", tenant);
        return ApiError::InvalidTenant.into_response();
    }

    tracing::debug!("Tenant validation successful: {}", tenant);
    request.extensions_mut().insert(ResolvedTenant(tenant));

    next.run(request).await
}
