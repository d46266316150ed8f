use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The environment variable '{0}' is not set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub tenant: TenantConfig,
    pub database: DatabaseConfig,
    pub provisioning: ProvisioningConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub push: PushConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// YAML file holding `tenants: [..]`
    pub allow_list_path: PathBuf,
    /// Used when neither the host nor the override header names a tenant
    pub default_tenant: String,
    pub override_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub admin_database: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub on_startup: bool,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    pub client_base_url: String,
    pub sender_email_address: String,
    pub sendgrid_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushConfig {
    pub gateway_url: Option<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_subject: String,
}

impl ProvisioningConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("API_SECRET_AUTH_KEY")?;

        // Set defaults based on environment, then override with specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.database.url = database_url;
        config.security.jwt_secret = jwt_secret;

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env::var("PORT").ok().and_then(|s| s.parse().ok()) {
            self.port = v;
        }

        // Tenant overrides
        if let Ok(v) = env::var("TENANTS_FILE") {
            self.tenant.allow_list_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DEFAULT_TENANT") {
            self.tenant.default_tenant = v;
        }
        if let Ok(v) = env::var("TENANT_HEADER") {
            self.tenant.override_header = v.to_ascii_lowercase();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_ADMIN_DB") {
            self.database.admin_database = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Provisioning overrides
        if let Ok(v) = env::var("PROVISION_MAX_ATTEMPTS") {
            self.provisioning.max_attempts = v.parse().unwrap_or(self.provisioning.max_attempts);
        }
        if let Ok(v) = env::var("PROVISION_RETRY_DELAY_MS") {
            self.provisioning.retry_delay_ms = v.parse().unwrap_or(self.provisioning.retry_delay_ms);
        }
        if let Ok(v) = env::var("PROVISION_ON_STARTUP") {
            self.provisioning.on_startup = v.parse().unwrap_or(self.provisioning.on_startup);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        // Mail overrides
        if let Ok(v) = env::var("CLIENT_BASE_URL") {
            self.mail.client_base_url = v;
        }
        if let Ok(v) = env::var("SENDER_EMAIL_ADDRESS") {
            self.mail.sender_email_address = v;
        }
        self.mail.sendgrid_api_key = env::var("SENDGRID_API_KEY").ok().or(self.mail.sendgrid_api_key);

        // Push overrides
        self.push.gateway_url = env::var("PUSH_GATEWAY_URL").ok().or(self.push.gateway_url);
        self.push.vapid_private_key = env::var("VAPID_PRIVATE_KEY").ok().or(self.push.vapid_private_key);

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            port: 8000,
            tenant: TenantConfig {
                allow_list_path: PathBuf::from("/var/pooper/conf/tenants.yaml"),
                default_tenant: "pooper".to_string(),
                override_header: "x-database".to_string(),
            },
            database: DatabaseConfig {
                url: String::new(),
                admin_database: "postgres".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            provisioning: ProvisioningConfig {
                max_attempts: 10,
                retry_delay_ms: 5_000,
                on_startup: true,
                admin_email: "admin@pooper.online".to_string(),
                admin_password: "admin".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                cors_origins: vec!["http://localhost:8080".to_string()],
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            mail: MailConfig {
                client_base_url: "http://localhost:8080".to_string(),
                sender_email_address: "no-reply@pooper.online".to_string(),
                sendgrid_api_key: None,
            },
            push: PushConfig {
                gateway_url: None,
                vapid_private_key: None,
                vapid_subject: "mailto:no-reply@pooper.online".to_string(),
            },
        }
    }

    pub fn development() -> Self {
        let mut config = Self::base(Environment::Development);
        config.provisioning.max_attempts = 3;
        config.provisioning.retry_delay_ms = 500;
        config.provisioning.on_startup = false;
        config
    }

    fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.jwt_expiry_hours = 24;
        config
    }

    fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.security.cors_origins = vec!["https://pooper.online".to_string()];
        config
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.tenant.default_tenant, "pooper");
        assert_eq!(config.tenant.override_header, "x-database");
        assert!(!config.provisioning.on_startup);
        assert_eq!(config.provisioning.max_attempts, 3);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.provisioning.on_startup);
        assert_eq!(config.provisioning.max_attempts, 10);
        assert_eq!(config.provisioning.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn staging_shortens_token_lifetime() {
        assert_eq!(AppConfig::staging().security.jwt_expiry_hours, 24);
        assert_eq!(AppConfig::development().security.jwt_expiry_hours, 24 * 7);
    }
}
