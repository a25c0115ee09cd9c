//! Tenant-scoped connection and parameter binding.

use std::borrow::Cow;

use agencyreport_core::{CompiledQuery, SqlValue};
use agencyreport_runner::{ReportError, RowSet, TenantConnection, TenantId};
use async_trait::async_trait;
use sqlx_core::pool::PoolConnection;
use sqlx_core::query::Query;
use sqlx_postgres::{PgArguments, Postgres};
use tracing::{debug, instrument};

use crate::coerce::{coerce_placeholders, needs_coercion};
use crate::decode::{decode_row, warn_duplicate_columns};
use crate::error::store_message;

/// A pooled connection to one tenant's database.
///
/// Dropping the value returns the connection to its pool, so a cancelled
/// or panicking caller never leaks it.
pub struct PgTenantConnection {
    tenant: TenantId,
    conn: Option<PoolConnection<Postgres>>,
}

impl PgTenantConnection {
    pub(crate) fn new(tenant: TenantId, conn: PoolConnection<Postgres>) -> Self {
        Self {
            tenant,
            conn: Some(conn),
        }
    }

    /// Returns the tenant this connection belongs to.
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Returns `true` once the connection has been released.
    pub fn is_released(&self) -> bool {
        self.conn.is_none()
    }
}

#[async_trait]
impl TenantConnection for PgTenantConnection {
    #[instrument(skip_all, fields(tenant = %self.tenant, params = query.params.len()))]
    async fn execute(&mut self, query: &CompiledQuery) -> Result<RowSet, ReportError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(ReportError::connection_unavailable(
                self.tenant.as_str(),
                "connection already released",
            ));
        };

        let sql = if needs_coercion(&query.params) {
            coerce_placeholders(&mut **conn, &query.sql, &query.params)
                .await
                .map_err(|e| ReportError::execution(store_message(&e)))?
        } else {
            Cow::Borrowed(query.sql.as_str())
        };

        // Not cached: the same text may be bound with different parameter
        // types on the next run.
        let rows = sqlx_core::query::query(&sql)
            .bind_params(&query.params)
            .persistent(false)
            .fetch_all(&mut **conn)
            .await
            .map_err(|e| ReportError::execution(store_message(&e)))?;

        debug!(rows = rows.len(), "Query returned");
        warn_duplicate_columns(rows.first());
        rows.iter()
            .map(decode_row)
            .collect::<Result<RowSet, _>>()
            .map_err(ReportError::execution)
    }

    async fn release(&mut self) {
        if self.conn.take().is_some() {
            debug!(tenant = %self.tenant, "Connection released");
        }
    }
}

/// Binds compiled parameters to a query in order.
pub(crate) trait BindParams<'q> {
    fn bind_params(self, params: &'q [SqlValue]) -> Self;
}

impl<'q> BindParams<'q> for Query<'q, Postgres, PgArguments> {
    fn bind_params(mut self, params: &'q [SqlValue]) -> Self {
        for param in params {
            self = match param {
                SqlValue::Text(s) => self.bind(s.as_str()),
                SqlValue::Integer(i) => self.bind(*i),
                SqlValue::Float(f) => self.bind(*f),
                SqlValue::Boolean(b) => self.bind(*b),
                SqlValue::Json(v) => self.bind(v.clone()),
                SqlValue::TextArray(v) => self.bind(v.clone()),
                SqlValue::IntegerArray(v) => self.bind(v.clone()),
                SqlValue::FloatArray(v) => self.bind(v.clone()),
                SqlValue::BooleanArray(v) => self.bind(v.clone()),
                SqlValue::Null => self.bind(None::<String>),
            };
        }
        self
    }
}
