//! Report query compiler for AgencyReport.
//!
//! Tenants describe ad-hoc tabular reports as a [`ReportConfig`]: tables,
//! columns, joins, filters, grouping, ordering and a limit. This crate turns
//! that untrusted description into SQL that is safe to run:
//!
//! - table, column and alias names are validated against a strict grammar
//!   and double-quoted ([`Identifier`])
//! - join predicates are parsed into two qualified columns and rebuilt
//!   ([`JoinCondition`])
//! - every literal is bound as a positional `$n` parameter ([`SqlValue`])
//!
//! Compilation does no I/O and keeps no state, so a [`QueryCompiler`] can be
//! shared freely across tenants and tasks.
//!
//! # Example
//!
//! ```
//! use agencyreport_core::{QueryCompiler, ReportConfig, SqlValue};
//! use serde_json::json;
//!
//! let report = ReportConfig::from_json(&json!({
//!     "tables": ["projects"],
//!     "columns": [{"table": "projects", "column": "id"}],
//!     "filters": [{"table": "projects", "column": "status", "operator": "=", "value": "open"}]
//! }))?;
//!
//! let query = QueryCompiler::new().compile(&report)?;
//! assert_eq!(
//!     query.sql,
//!     r#"SELECT "projects"."id" FROM "projects" WHERE "projects"."status" = $1"#
//! );
//! assert_eq!(query.params, vec![SqlValue::Text("open".into())]);
//! # Ok::<(), agencyreport_core::CompileError>(())
//! ```

mod assembler;
mod clauses;
mod error;
mod identifier;
mod join;
mod report;
mod value;

pub use assembler::{CompiledQuery, CompilerOptions, MAX_LIMIT, QueryCompiler};
pub use clauses::{Aggregate, FilterOperator, JoinType, SortOrder};
pub use error::{CompileError, ValidationError};
pub use identifier::{
    Identifier, MAX_IDENTIFIER_LEN, QualifiedColumn, quote_identifier, validate_identifier,
};
pub use join::{JoinCondition, validate_join_condition};
pub use report::{
    ColumnRef, FilterSpec, GroupByItem, JoinSpec, LimitValue, OrderByItem, ReportConfig,
};
pub use value::SqlValue;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, CompileError>;
