//! Report execution against a tenant's database.
//!
//! [`ReportRunner`] compiles a report, acquires a connection for the tenant,
//! executes the query and returns structured rows.

use std::sync::Arc;

use agencyreport_core::{CompiledQuery, QueryCompiler, ReportConfig};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::output::{OutputFormat, RenderedReport, get_writer};
use crate::tenant::{Row, RowSet, TenantId, TenantRouter};

/// Executes report definitions for tenants.
pub struct ReportRunner {
    router: Arc<dyn TenantRouter>,
    compiler: QueryCompiler,
}

impl ReportRunner {
    /// Create a new ReportRunner routing through the given tenant router.
    pub fn new(router: Arc<dyn TenantRouter>) -> Self {
        Self {
            router,
            compiler: QueryCompiler::new(),
        }
    }

    /// Create a new ReportRunner with a custom compiler.
    pub fn with_compiler(router: Arc<dyn TenantRouter>, compiler: QueryCompiler) -> Self {
        Self { router, compiler }
    }

    /// Get the compiler used by this runner.
    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Compile a report without executing it.
    ///
    /// # Errors
    ///
    /// Returns a configuration or validation error if the report is rejected.
    pub fn explain(&self, report: &ReportConfig) -> Result<CompiledQuery> {
        Ok(self.compiler.compile(report)?)
    }

    /// Compile and execute a report for a tenant.
    ///
    /// Compilation happens before any connection is acquired, so a rejected
    /// report never touches the tenant's database.
    ///
    /// # Errors
    ///
    /// Returns an error if compilation fails, no connection is available or
    /// the query fails to execute.
    #[instrument(skip_all, fields(tenant = %tenant))]
    pub async fn run(&self, tenant: &TenantId, report: &ReportConfig) -> Result<ReportResult> {
        let query = self.compiler.compile(report)?;
        self.execute(tenant, &query).await
    }

    /// Execute an already compiled query for a tenant.
    ///
    /// The acquired connection is released on every path.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the query fails.
    #[instrument(skip_all, fields(tenant = %tenant, params = query.params.len()))]
    pub async fn execute(&self, tenant: &TenantId, query: &CompiledQuery) -> Result<ReportResult> {
        let mut conn = self.router.acquire(tenant).await?;

        debug!(sql = %query.sql, "Executing report");
        let outcome = conn.execute(query).await;
        conn.release().await;

        match outcome {
            Ok(rows) => {
                debug!(rows = rows.len(), "Report executed");
                Ok(ReportResult::from_rows(rows))
            }
            Err(e) => {
                warn!(error = %e, "Report execution failed");
                Err(e)
            }
        }
    }

    /// Compile, execute and serialize a report in the requested format.
    ///
    /// # Errors
    ///
    /// Returns an error if running the report or serializing its rows fails.
    pub async fn render(
        &self,
        tenant: &TenantId,
        report: &ReportConfig,
        format: OutputFormat,
    ) -> Result<RenderedReport> {
        let result = self.run(tenant, report).await?;
        render_result(result, format)
    }
}

/// Serialize a result in the requested format.
///
/// JSON yields the structured rows unchanged. PDF and Excel are handed back
/// as [`RenderedReport::Delegated`] for an external renderer.
///
/// # Errors
///
/// Returns an output error if a text writer fails.
pub fn render_result(result: ReportResult, format: OutputFormat) -> Result<RenderedReport> {
    match format {
        OutputFormat::Json => Ok(RenderedReport::Rows(result)),
        OutputFormat::Pdf | OutputFormat::Excel => {
            Ok(RenderedReport::Delegated { format, result })
        }
        OutputFormat::Ndjson | OutputFormat::Csv => {
            let writer = get_writer(format)?;
            let body = writer.write_to_string(&result)?;
            Ok(RenderedReport::Text {
                content_type: writer.content_type(),
                body,
            })
        }
    }
}

static NULL: Value = Value::Null;

/// Results from executing a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportResult {
    /// Column names in select-list order, taken from the first row.
    pub columns: Vec<String>,

    /// Result rows.
    pub rows: Vec<Row>,

    /// Number of rows returned.
    pub row_count: usize,
}

impl ReportResult {
    /// Build a result from the rows a connection returned.
    pub fn from_rows(rows: RowSet) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Returns `true` if the query produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all values of a column in row order.
    pub fn column_values(&self, name: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&NULL))
            .collect()
    }

    /// Convert the rows to a JSON array of objects.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|row| {
                    Value::Object(row.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                })
                .collect(),
        )
    }
}
