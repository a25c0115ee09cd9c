//! Report definition types.
//!
//! A [`ReportConfig`] is supplied by the caller (usually deserialized from an
//! API request body) and consumed once by the compiler. Nothing here is
//! trusted: every name is validated during compilation, not on parse.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CompileError;

/// Caller-supplied description of a tabular report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Tables referenced by the report. The first one is the FROM table.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Output columns in order.
    #[serde(default)]
    pub columns: Vec<ColumnRef>,

    /// Joins, applied in the order given.
    #[serde(default)]
    pub joins: Vec<JoinSpec>,

    /// Filters, combined with AND.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    #[serde(default)]
    pub group_by: Vec<GroupByItem>,

    #[serde(default)]
    pub order_by: Vec<OrderByItem>,

    /// Maximum number of rows. Accepts a number or a numeric string.
    #[serde(default)]
    pub limit: Option<LimitValue>,
}

/// A selected column, optionally aggregated and aliased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            aggregate: None,
            alias: None,
        }
    }

    #[must_use]
    pub fn with_aggregate(mut self, aggregate: impl Into<String>) -> Self {
        self.aggregate = Some(aggregate.into());
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name of this column in result rows: the alias, else the column name.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

/// A join against another table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub table: String,

    /// INNER, LEFT, RIGHT, FULL or CROSS; anything else means INNER.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<String>,

    /// `table.column = table.column`. Not needed for CROSS joins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl JoinSpec {
    pub fn new(
        table: impl Into<String>,
        join_type: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            join_type: Some(join_type.into()),
            condition: Some(condition.into()),
        }
    }
}

/// A single `column <op> value` restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub table: String,
    pub column: String,

    /// Defaults to `=` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default)]
    pub value: Value,
}

impl FilterSpec {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            operator: Some(operator.into()),
            value,
        }
    }
}

/// A GROUP BY entry: a bare column name or a `{table, column}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupByItem {
    Column(String),
    Qualified {
        #[serde(default)]
        table: Option<String>,
        column: String,
    },
}

impl GroupByItem {
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Column(_) => None,
            Self::Qualified { table, .. } => table.as_deref(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Column(column) | Self::Qualified { column, .. } => column,
        }
    }
}

/// An ORDER BY entry: a bare column name (ascending) or a full spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderByItem {
    Column(String),
    Spec {
        column: String,
        #[serde(default)]
        direction: Option<String>,
        #[serde(default)]
        table: Option<String>,
    },
}

impl OrderByItem {
    pub fn desc(column: impl Into<String>) -> Self {
        Self::Spec {
            column: column.into(),
            direction: Some("DESC".into()),
            table: None,
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Column(_) => None,
            Self::Spec { table, .. } => table.as_deref(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Column(column) | Self::Spec { column, .. } => column,
        }
    }

    pub fn direction(&self) -> Option<&str> {
        match self {
            Self::Column(_) => None,
            Self::Spec { direction, .. } => direction.as_deref(),
        }
    }
}

/// Raw limit as received; parsed and range-checked during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(serde_json::Number),
    Text(String),
}

impl From<u64> for LimitValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl ReportConfig {
    /// Parse a report from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Configuration`] if the JSON does not have the
    /// shape of a report.
    pub fn from_json(value: &Value) -> Result<Self, CompileError> {
        serde_json::from_value(value.clone()).map_err(|e| CompileError::configuration(e.to_string()))
    }

    /// Parse a report from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Configuration`] if the string is not a valid report.
    pub fn from_json_str(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::configuration(e.to_string()))
    }

    /// Result names selected more than once, in first-repeat order.
    ///
    /// Rows are keyed by result name, so only one value per name survives.
    pub fn duplicate_output_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in self.columns.iter().map(ColumnRef::output_name) {
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Start a report selecting from `table`.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            tables: vec![table.into()],
            ..Default::default()
        }
    }
}
