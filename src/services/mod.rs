pub mod email_service;
pub mod notification_service;
pub mod tenant_service;

pub use email_service::{EmailService, MailError};
pub use notification_service::{PushError, PushService};
pub use tenant_service::{AllowList, TenantService};
