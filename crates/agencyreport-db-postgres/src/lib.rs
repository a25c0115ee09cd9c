//! PostgreSQL tenant backend for AgencyReport.
//!
//! This crate provides a PostgreSQL implementation of the `TenantRouter`
//! trait from `agencyreport-runner`. Each agency has its own database; the
//! router keeps one pool per tenant, hands out scoped connections, binds
//! compiled parameters and decodes rows into JSON.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use agencyreport_db_postgres::{PgTenantRouter, PostgresConfig, TenantDatabaseConfig};
//! use agencyreport_runner::{ReportRunner, TenantId};
//!
//! let router = PgTenantRouter::new(
//!     PostgresConfig::new().with_pool_size(4),
//!     TenantDatabaseConfig::new("postgres://report:secret@db:5432/{database}"),
//! )?;
//! let runner = ReportRunner::new(Arc::new(router));
//! let result = runner.run(&TenantId::new("north")?, &report).await?;
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Pool settings and tenant-to-database mapping
//! - [`error`]: Error types specific to PostgreSQL operations
//! - [`pool`]: Connection pool creation
//! - [`router`]: Tenant-keyed pool registry
//! - [`schema`]: Per-tenant one-time initialization

mod coerce;
pub mod config;
mod connection;
mod decode;
pub mod error;
pub mod pool;
pub mod router;
pub mod schema;

// Re-export main types
pub use config::{PostgresConfig, TenantDatabaseConfig};
pub use connection::PgTenantConnection;
pub use decode::{decode_row, numeric_to_json};
pub use error::{PostgresError, Result};
pub use pool::{create_pool, mask_password};
pub use router::PgTenantRouter;
pub use schema::{SchemaInitializer, SchemaRegistry, SqlScriptInitializer};
