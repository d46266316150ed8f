pub mod auth;
pub mod response;
pub mod validate_tenant;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use validate_tenant::{validate_tenant_middleware, ResolvedTenant};
