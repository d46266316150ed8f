use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use super::manager::{build_connection_string, quote_identifier, DatabaseError};
use super::schema::SCHEMA;
use crate::auth::hash_password;
use crate::config::{DatabaseConfig, ProvisioningConfig};

/// Storage operations the DatabaseManager needs to bring a tenant up.
/// Every `ensure_*` call must be idempotent.
#[async_trait]
pub trait TenantBackend: Send + Sync {
    /// Pool bound to the named database. Must not perform I/O.
    fn pool(&self, database: &str) -> Result<PgPool, DatabaseError>;

    async fn ensure_database(&self, database: &str) -> Result<(), DatabaseError>;

    async fn ensure_schema(&self, pool: &PgPool) -> Result<(), DatabaseError>;

    /// Returns true when the admin account had to be created.
    async fn ensure_admin(&self, pool: &PgPool) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Postgres backend: one database per tenant on a shared server.
pub struct PgBackend {
    database: DatabaseConfig,
    provisioning: ProvisioningConfig,
    bcrypt_cost: u32,
    admin_pool: OnceCell<PgPool>,
}

/// SQLSTATE raised by CREATE DATABASE when another process won the race
const DUPLICATE_DATABASE: &str = "42P04";

impl PgBackend {
    pub fn new(database: DatabaseConfig, provisioning: ProvisioningConfig, bcrypt_cost: u32) -> Self {
        Self {
            database,
            provisioning,
            bcrypt_cost,
            admin_pool: OnceCell::new(),
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.database.max_connections)
            .acquire_timeout(Duration::from_secs(self.database.connection_timeout))
    }

    /// Administrative pool on the admin database, used for CREATE DATABASE
    async fn admin_pool(&self) -> Result<&PgPool, DatabaseError> {
        self.admin_pool
            .get_or_try_init(|| async {
                let url = build_connection_string(&self.database.url, &self.database.admin_database)?;
                let pool = PgPoolOptions::new()
                    .max_connections(2)
                    .acquire_timeout(Duration::from_secs(self.database.connection_timeout))
                    .connect_lazy(&url)?;
                Ok::<_, DatabaseError>(pool)
            })
            .await
    }
}

#[async_trait]
impl TenantBackend for PgBackend {
    fn pool(&self, database: &str) -> Result<PgPool, DatabaseError> {
        let url = build_connection_string(&self.database.url, database)?;
        Ok(self.pool_options().connect_lazy(&url)?)
    }

    async fn ensure_database(&self, database: &str) -> Result<(), DatabaseError> {
        let admin = self.admin_pool().await?;

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(database)
                .fetch_one(admin)
                .await?;
        if exists.0 {
            return Ok(());
        }

        let query = format!("CREATE DATABASE {}", quote_identifier(database));
        match sqlx::query(&query).execute(admin).await {
            Ok(_) => {
                info!("Created database: {}", database);
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(DUPLICATE_DATABASE) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_schema(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        let mut tx = pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn ensure_admin(&self, pool: &PgPool) -> Result<bool, DatabaseError> {
        let email = &self.provisioning.admin_email;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email_address = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        info!("Creating user with username {}", email);
        let password_hash = hash_password(&self.provisioning.admin_password, self.bcrypt_cost).await?;
        let now = Utc::now();

        // The unique index on email_address settles concurrent seeders
        let result = sqlx::query(
            "INSERT INTO users (first_name, last_name, email_address, password_hash, is_disabled, created, updated)
             VALUES ('Admin', 'Admin', $1, $2, FALSE, $3, $3)
             ON CONFLICT (email_address) DO NOTHING",
        )
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        let admin = self.admin_pool().await?;
        sqlx::query("SELECT 1").execute(admin).await?;
        Ok(())
    }
}
