//! Per-tenant schema initialization tracking.
//!
//! Each tenant database may need one-time setup (extensions, reporting
//! views) before the first report runs against it. [`SchemaRegistry`] makes
//! sure that setup runs exactly once per tenant even under concurrent first
//! use, and forgets a tenant when its pool is evicted.

use std::future::Future;
use std::sync::Arc;

use agencyreport_runner::TenantId;
use async_trait::async_trait;
use dashmap::DashMap;
use sqlx_postgres::PgPool;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// One-time setup for a tenant database.
#[async_trait]
pub trait SchemaInitializer: Send + Sync {
    /// Prepares the tenant's database.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup statement fails. The tenant stays
    /// uninitialized and setup is retried on the next acquisition.
    async fn initialize(&self, tenant: &TenantId, pool: &PgPool) -> Result<()>;
}

/// Runs a fixed list of SQL statements against each tenant database.
#[derive(Debug, Clone, Default)]
pub struct SqlScriptInitializer {
    statements: Vec<String>,
}

impl SqlScriptInitializer {
    /// Creates an initializer from operator-supplied statements.
    #[must_use]
    pub fn new(statements: Vec<String>) -> Self {
        Self { statements }
    }

    /// Returns the statements this initializer runs.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[async_trait]
impl SchemaInitializer for SqlScriptInitializer {
    #[instrument(skip_all, fields(tenant = %tenant, statements = self.statements.len()))]
    async fn initialize(&self, tenant: &TenantId, pool: &PgPool) -> Result<()> {
        for statement in &self.statements {
            sqlx_core::query::query(statement).execute(pool).await?;
        }
        info!("Tenant schema initialized");
        Ok(())
    }
}

/// Tracks which tenants have completed schema initialization.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tenants: DashMap<TenantId, Arc<OnceCell<()>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `init` for the tenant unless it already completed.
    ///
    /// Concurrent callers for the same tenant wait for a single run. A failed
    /// run leaves the tenant uninitialized. Returns `true` if this call ran
    /// `init`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `init`.
    pub async fn ensure_initialized<F, Fut>(&self, tenant: &TenantId, init: F) -> Result<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let cell = Arc::clone(
            self.tenants
                .entry(tenant.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        if cell.initialized() {
            return Ok(false);
        }

        let mut ran = false;
        cell.get_or_try_init(|| {
            ran = true;
            init()
        })
        .await?;

        if ran {
            debug!(tenant = %tenant, "Schema registry marked tenant initialized");
        }
        Ok(ran)
    }

    /// Returns `true` if the tenant completed initialization.
    pub fn is_initialized(&self, tenant: &TenantId) -> bool {
        self.tenants
            .get(tenant)
            .is_some_and(|cell| cell.initialized())
    }

    /// Forgets a tenant so the next acquisition initializes it again.
    pub fn teardown(&self, tenant: &TenantId) {
        if self.tenants.remove(tenant).is_some() {
            debug!(tenant = %tenant, "Schema registry entry removed");
        }
    }

    /// Forgets every tenant.
    pub fn clear(&self) {
        self.tenants.clear();
    }

    /// Number of tenants that completed initialization.
    pub fn initialized_count(&self) -> usize {
        self.tenants
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }
}
