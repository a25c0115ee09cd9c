//! Tenant-scoped report execution for AgencyReport.
//!
//! This crate sits between the report compiler and a tenant's database. It
//! never builds SQL itself; it runs whatever [`agencyreport_core`] compiled,
//! against the connection a [`TenantRouter`] hands out, and serializes the
//! rows.
//!
//! # Components
//!
//! - [`TenantId`] - Validated agency identifier
//! - [`TenantRouter`] / [`TenantConnection`] - Seam to the per-tenant store
//! - [`ReportRunner`] - Compiles, executes and renders reports
//! - [`output`] - JSON, NDJSON and CSV writers
//!
//! # Example
//!
//! ```ignore
//! use agencyreport_runner::{OutputFormat, ReportRunner, TenantId};
//!
//! let runner = ReportRunner::new(router);
//! let tenant = TenantId::new("agency_42")?;
//! let rendered = runner.render(&tenant, &report, OutputFormat::Csv).await?;
//! ```

mod error;
pub mod output;
mod runner;
mod tenant;

pub use error::{ReportError, Result};
pub use output::{OutputFormat, OutputWriter, RenderedReport};
pub use runner::{ReportResult, ReportRunner, render_result};
pub use tenant::{MAX_TENANT_ID_LEN, Row, RowSet, TenantConnection, TenantId, TenantRouter};
