//! Tenant-keyed pool registry.

use std::sync::Arc;

use agencyreport_runner::{ReportError, TenantConnection, TenantId, TenantRouter};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sqlx_postgres::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::config::{PostgresConfig, TenantDatabaseConfig};
use crate::connection::PgTenantConnection;
use crate::error::{PostgresError, Result};
use crate::pool::{create_pool, test_connection};
use crate::schema::{SchemaInitializer, SchemaRegistry, SqlScriptInitializer};

/// Routes each tenant to its own PostgreSQL database.
///
/// Pools are created lazily on a tenant's first acquisition and kept for
/// the router's lifetime. When two tasks race to create the same tenant's
/// pool, one pool is registered and the other is closed.
pub struct PgTenantRouter {
    pool_config: PostgresConfig,
    tenant_config: TenantDatabaseConfig,
    pools: DashMap<TenantId, PgPool>,
    schemas: SchemaRegistry,
    initializer: Option<Arc<dyn SchemaInitializer>>,
}

impl PgTenantRouter {
    /// Creates a router. No connection is opened until the first acquisition.
    ///
    /// When `tenant_config.init_statements` is non-empty they run once per
    /// tenant through a [`SqlScriptInitializer`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either config fails validation.
    pub fn new(pool_config: PostgresConfig, tenant_config: TenantDatabaseConfig) -> Result<Self> {
        pool_config.validate()?;
        tenant_config.validate()?;

        let initializer: Option<Arc<dyn SchemaInitializer>> =
            if tenant_config.init_statements.is_empty() {
                None
            } else {
                Some(Arc::new(SqlScriptInitializer::new(
                    tenant_config.init_statements.clone(),
                )))
            };

        Ok(Self {
            pool_config,
            tenant_config,
            pools: DashMap::new(),
            schemas: SchemaRegistry::new(),
            initializer,
        })
    }

    /// Replaces the schema initializer run on each tenant's first use.
    #[must_use]
    pub fn with_initializer(mut self, initializer: Arc<dyn SchemaInitializer>) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Returns the schema registry.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Number of tenants with an open pool.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Returns the tenant's pool, creating and initializing it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant is not allowed, its database cannot be
    /// reached or schema initialization fails.
    #[instrument(skip_all, fields(tenant = %tenant))]
    pub async fn pool(&self, tenant: &TenantId) -> Result<PgPool> {
        let existing = self.pools.get(tenant).map(|pool| pool.clone());
        let pool = match existing {
            Some(pool) => pool,
            None => self.register_pool(tenant).await?,
        };

        if let Some(initializer) = &self.initializer {
            self.schemas
                .ensure_initialized(tenant, || initializer.initialize(tenant, &pool))
                .await?;
        }

        Ok(pool)
    }

    async fn register_pool(&self, tenant: &TenantId) -> Result<PgPool> {
        let url = self.tenant_config.database_url(tenant)?;
        let pool = create_pool(&self.pool_config, &url).await?;

        let (pool, loser) = match self.pools.entry(tenant.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), Some(pool)),
            Entry::Vacant(slot) => {
                slot.insert(pool.clone());
                (pool, None)
            }
        };

        match loser {
            Some(loser) => {
                debug!("Another task registered the tenant pool first");
                loser.close().await;
            }
            None => info!(
                database = %self.tenant_config.database_name(tenant),
                "Tenant pool registered"
            ),
        }

        Ok(pool)
    }

    /// Checks that the tenant's database answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or the probe fails.
    pub async fn ping(&self, tenant: &TenantId) -> Result<()> {
        let pool = self.pool(tenant).await?;
        test_connection(&pool).await
    }

    /// Closes and forgets a tenant's pool.
    ///
    /// The tenant's schema registry entry is torn down as well. Returns
    /// `true` if a pool was open.
    #[instrument(skip_all, fields(tenant = %tenant))]
    pub async fn evict(&self, tenant: &TenantId) -> bool {
        self.schemas.teardown(tenant);
        match self.pools.remove(tenant) {
            Some((_, pool)) => {
                pool.close().await;
                info!("Tenant pool evicted");
                true
            }
            None => false,
        }
    }

    /// Closes every tenant pool.
    pub async fn close_all(&self) {
        let tenants: Vec<TenantId> = self.pools.iter().map(|e| e.key().clone()).collect();
        for tenant in &tenants {
            self.evict(tenant).await;
        }
        self.schemas.clear();
        info!(closed = tenants.len(), "All tenant pools closed");
    }
}

#[async_trait]
impl TenantRouter for PgTenantRouter {
    #[instrument(skip_all, fields(tenant = %tenant))]
    async fn acquire(
        &self,
        tenant: &TenantId,
    ) -> std::result::Result<Box<dyn TenantConnection>, ReportError> {
        let pool = self
            .pool(tenant)
            .await
            .map_err(|e| e.into_report_error(tenant))?;

        let conn = pool.acquire().await.map_err(|e| {
            warn!(error = %e, "Failed to acquire tenant connection");
            PostgresError::from(e).into_report_error(tenant)
        })?;

        Ok(Box::new(PgTenantConnection::new(tenant.clone(), conn)))
    }
}
