use axum::http::{header, HeaderMap, Uri};
use serde::Deserialize;
use std::path::Path;

use crate::config::TenantConfig;

/// Tenants permitted to be served, as listed in the tenants YAML file:
///
/// ```yaml
/// tenants:
///   - acme
///   - globex
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AllowList {
    #[serde(default)]
    tenants: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tenants: tenants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Option<Self>>(contents)?.unwrap_or_default())
    }

    /// Read the allow-list file. A missing, unreadable or malformed file
    /// yields an empty list, which rejects every tenant.
    pub async fn load(path: &Path) -> Self {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Tenant allow-list {} is unavailable: {}", path.display(), e);
                return Self::default();
            }
        };

        Self::from_yaml(&contents).unwrap_or_else(|e| {
            tracing::warn!("Tenant allow-list {} is malformed: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn contains(&self, tenant: &str) -> bool {
        self.tenants.iter().any(|t| t == tenant)
    }

    pub fn tenants(&self) -> &[String] {
        &self.tenants
    }
}

/// Resolves which tenant a request is for and whether it may be served
#[derive(Debug, Clone)]
pub struct TenantService {
    config: TenantConfig,
}

impl TenantService {
    pub fn new(config: TenantConfig) -> Self {
        Self { config }
    }

    /// Tenant named by the request: the override header if present, else the
    /// subdomain of a dotted host, else the configured default.
    pub fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> String {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.host());

        let mut tenant = self.config.default_tenant.clone();

        // Get db from hostname. Hosts are case-insensitive, header values are not.
        if let Some((subdomain, _)) = host.and_then(|h| h.split_once('.')) {
            tenant = subdomain.to_ascii_lowercase();
        }

        // Get db from headers
        if let Some(value) = headers.get(self.config.override_header.as_str()) {
            tenant = String::from_utf8_lossy(value.as_bytes()).into_owned();
        }

        tenant
    }

    pub async fn allow_list(&self) -> AllowList {
        AllowList::load(&self.config.allow_list_path).await
    }

    pub async fn is_valid(&self, tenant: &str) -> bool {
        self.allow_list().await.contains(tenant)
    }
}
