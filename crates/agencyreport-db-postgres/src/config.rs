//! Configuration types for the PostgreSQL tenant backend.

use agencyreport_runner::TenantId;
use serde::{Deserialize, Serialize};

use crate::error::{PostgresError, Result};

/// Placeholder replaced by the tenant's database name in a URL template.
pub const DATABASE_PLACEHOLDER: &str = "{database}";

/// Pool settings applied to every tenant pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// Connection pool size (maximum number of connections per tenant).
    pub pool_size: u32,

    /// Minimum idle connections kept per tenant. Defaults to a quarter of
    /// `pool_size`, at least one.
    pub min_connections: Option<u32>,

    /// Connection and acquire timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Idle timeout in milliseconds.
    /// Connections idle longer than this will be closed.
    pub idle_timeout_ms: Option<u64>,

    /// Maximum connection lifetime in seconds.
    pub max_lifetime_secs: Option<u64>,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            min_connections: None,
            connect_timeout_ms: 5000,
            idle_timeout_ms: Some(300_000), // 5 minutes
            max_lifetime_secs: Some(1800),
        }
    }
}

impl PostgresConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the minimum number of connections.
    #[must_use]
    pub fn with_min_connections(mut self, min: Option<u32>) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn with_idle_timeout_ms(mut self, timeout: Option<u64>) -> Self {
        self.idle_timeout_ms = timeout;
        self
    }

    /// Sets the maximum connection lifetime.
    #[must_use]
    pub fn with_max_lifetime_secs(mut self, secs: Option<u64>) -> Self {
        self.max_lifetime_secs = secs;
        self
    }

    /// Checks the settings for obvious mistakes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pool size is zero or smaller than
    /// the minimum connection count.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(PostgresError::config("pool_size must be greater than 0"));
        }
        if let Some(min) = self.min_connections
            && min > self.pool_size
        {
            return Err(PostgresError::config(format!(
                "min_connections ({min}) exceeds pool_size ({})",
                self.pool_size
            )));
        }
        Ok(())
    }
}

/// How a tenant id maps to its database.
///
/// Each agency owns one database named `database_prefix + tenant id`,
/// reached through `url_template` with `{database}` substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantDatabaseConfig {
    /// Connection URL with a `{database}` placeholder.
    pub url_template: String,

    /// Prefix prepended to the tenant id to form the database name.
    pub database_prefix: String,

    /// Tenants this router may serve. Empty means any valid tenant id.
    pub allowed_tenants: Vec<String>,

    /// Statements run once per tenant before its first connection is
    /// handed out.
    pub init_statements: Vec<String>,
}

impl Default for TenantDatabaseConfig {
    fn default() -> Self {
        Self {
            url_template: "postgres://localhost:5432/{database}".into(),
            database_prefix: "agency_".into(),
            allowed_tenants: Vec::new(),
            init_statements: Vec::new(),
        }
    }
}

impl TenantDatabaseConfig {
    /// Creates a new configuration with the given URL template.
    #[must_use]
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Default::default()
        }
    }

    /// Sets the database name prefix.
    #[must_use]
    pub fn with_database_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.database_prefix = prefix.into();
        self
    }

    /// Restricts the router to the given tenants.
    #[must_use]
    pub fn with_allowed_tenants<I, S>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tenants = tenants.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the per-tenant initialization statements.
    #[must_use]
    pub fn with_init_statements<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.init_statements = statements.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the template and prefix.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the template lacks the placeholder
    /// or the prefix contains characters not allowed in tenant ids.
    pub fn validate(&self) -> Result<()> {
        if !self.url_template.contains(DATABASE_PLACEHOLDER) {
            return Err(PostgresError::config(format!(
                "url_template must contain {DATABASE_PLACEHOLDER}"
            )));
        }
        if !self
            .database_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(PostgresError::config(format!(
                "invalid database_prefix: {}",
                self.database_prefix
            )));
        }
        for tenant in &self.allowed_tenants {
            TenantId::new(tenant.as_str())
                .map_err(|e| PostgresError::config(format!("allowed_tenants: {e}")))?;
        }
        Ok(())
    }

    /// Returns `true` if the router may serve this tenant.
    pub fn is_allowed(&self, tenant: &TenantId) -> bool {
        self.allowed_tenants.is_empty()
            || self.allowed_tenants.iter().any(|t| t == tenant.as_str())
    }

    /// Returns the database name for a tenant.
    pub fn database_name(&self, tenant: &TenantId) -> String {
        format!("{}{}", self.database_prefix, tenant)
    }

    /// Builds the connection URL for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresError::InvalidTenant`] if the tenant is not in the
    /// allow-list.
    pub fn database_url(&self, tenant: &TenantId) -> Result<String> {
        if !self.is_allowed(tenant) {
            return Err(PostgresError::invalid_tenant(
                tenant,
                "tenant is not configured on this server",
            ));
        }
        Ok(self
            .url_template
            .replace(DATABASE_PLACEHOLDER, &self.database_name(tenant)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PostgresConfig::default();
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.idle_timeout_ms, Some(300_000));
        assert_eq!(config.max_lifetime_secs, Some(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PostgresConfig::new()
            .with_pool_size(20)
            .with_min_connections(Some(2))
            .with_connect_timeout_ms(10000)
            .with_idle_timeout_ms(None)
            .with_max_lifetime_secs(None);

        assert_eq!(config.pool_size, 20);
        assert_eq!(config.min_connections, Some(2));
        assert_eq!(config.connect_timeout_ms, 10000);
        assert_eq!(config.idle_timeout_ms, None);
        assert_eq!(config.max_lifetime_secs, None);
    }

    #[test]
    fn test_pool_config_validation() {
        assert!(PostgresConfig::new().with_pool_size(0).validate().is_err());
        assert!(
            PostgresConfig::new()
                .with_pool_size(2)
                .with_min_connections(Some(3))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: PostgresConfig = serde_json::from_str(r#"{"pool_size": 12}"#).unwrap();
        assert_eq!(config.pool_size, 12);
        assert_eq!(config.connect_timeout_ms, 5000);
    }

    #[test]
    fn test_database_url() {
        let config = TenantDatabaseConfig::new("postgres://report:secret@db:5432/{database}");
        assert_eq!(
            config.database_url(&tenant("north")).unwrap(),
            "postgres://report:secret@db:5432/agency_north"
        );

        let config = config.with_database_prefix("");
        assert_eq!(config.database_name(&tenant("north")), "north");
    }

    #[test]
    fn test_allow_list() {
        let config = TenantDatabaseConfig::default().with_allowed_tenants(["north", "south"]);
        assert!(config.database_url(&tenant("north")).is_ok());
        assert!(matches!(
            config.database_url(&tenant("east")),
            Err(PostgresError::InvalidTenant { .. })
        ));
    }

    #[test]
    fn test_tenant_config_validation() {
        assert!(TenantDatabaseConfig::default().validate().is_ok());
        assert!(
            TenantDatabaseConfig::new("postgres://localhost/fixed")
                .validate()
                .is_err()
        );
        assert!(
            TenantDatabaseConfig::default()
                .with_database_prefix("a-b/")
                .validate()
                .is_err()
        );
        assert!(
            TenantDatabaseConfig::default()
                .with_allowed_tenants(["ok", "not ok"])
                .validate()
                .is_err()
        );
    }
}
