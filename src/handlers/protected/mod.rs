// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here runs behind the tenant gate and the JWT middleware, so
// the `AuthUser` extension is present and belongs to the resolved tenant.

pub mod animals;
pub mod conditions;
pub mod events;
pub mod notes;
pub mod notifications;
pub mod trips;
pub mod users;

use serde::Deserialize;

use crate::database::models::User;
use crate::database::{repository, TenantSession};
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// `?page=&page_size=` query parameters shared by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub(crate) fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Result<Self, ApiError> {
        if page < 0 || page_size < 0 {
            return Err(ApiError::bad_request("page and page_size must not be negative"));
        }
        Ok(Self { page, page_size })
    }

    pub fn validated(self) -> Result<Self, ApiError> {
        Self::new(self.page, self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.page_size)
    }
}

/// Load the user behind the bearer token. A token whose user has since been
/// removed or disabled no longer authenticates.
pub async fn current_user(session: &mut TenantSession, auth: &AuthUser) -> Result<User, ApiError> {
    match repository::find_user_by_email(session.connection(), &auth.email_address).await? {
        Some(user) if !user.is_disabled => Ok(user),
        _ => {
            tracing::warn!(
                "Token for {} no longer matches an active user in tenant '{}'",
                auth.email_address,
                auth.tenant
            );
            Err(ApiError::invalid_credentials())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_page_times_page_size() {
        assert_eq!(Pagination::default().offset(), 0);
        assert_eq!(Pagination::default().limit(), 100);
        assert_eq!(Pagination::new(3, 25).unwrap().offset(), 75);
    }

    #[test]
    fn query_defaults() {
        let pagination: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!((pagination.page, pagination.page_size), (0, 100));
        assert!(Pagination::new(-1, 10).is_err());
    }
}
