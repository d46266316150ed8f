pub mod backend;
pub mod manager;
pub mod models;
pub mod repository;
pub mod schema;
pub mod session;

pub use backend::{PgBackend, TenantBackend};
pub use manager::{DatabaseError, DatabaseManager};
pub use session::TenantSession;
