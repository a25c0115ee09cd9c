//! Query assembly from report definitions.
//!
//! [`QueryCompiler`] turns a [`ReportConfig`] into SQL text plus an ordered
//! parameter list. Every identifier is validated and quoted, join predicates
//! are rebuilt from their parsed parts, and every literal is bound as `$n`.
//! Compilation is pure: no I/O, no shared state, and nothing is returned
//! unless the whole report validates.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clauses::{Aggregate, FilterOperator, JoinType, SortOrder};
use crate::error::{CompileError, ValidationError};
use crate::identifier::{Identifier, QualifiedColumn};
use crate::join::JoinCondition;
use crate::report::{
    ColumnRef, FilterSpec, GroupByItem, JoinSpec, LimitValue, OrderByItem, ReportConfig,
};
use crate::value::SqlValue;

/// Largest row limit a report may request.
pub const MAX_LIMIT: u64 = 10_000;

/// Compiled SQL text and its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl std::fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Tunables for [`QueryCompiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Reject unknown filter operators instead of treating them as `=`.
    pub strict_operators: bool,

    /// Upper bound for `limit`; clamped to [`MAX_LIMIT`].
    pub max_limit: u64,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            strict_operators: false,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Compiles [`ReportConfig`]s into parameterized SQL.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    options: CompilerOptions,
}

impl QueryCompiler {
    /// Create a compiler with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options: CompilerOptions {
                max_limit: options.max_limit.clamp(1, MAX_LIMIT),
                ..options
            },
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile a report into SQL and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Configuration`] when `tables` or `columns` is
    /// empty and [`CompileError::Validation`] for the first invalid field.
    pub fn compile(&self, report: &ReportConfig) -> Result<CompiledQuery, CompileError> {
        if report.tables.is_empty() {
            return Err(CompileError::configuration("report must name at least one table"));
        }
        if report.columns.is_empty() {
            return Err(CompileError::configuration("report must select at least one column"));
        }

        let tables = report
            .tables
            .iter()
            .map(|t| Identifier::parse(t))
            .collect::<Result<Vec<_>, _>>()?;

        let select = report
            .columns
            .iter()
            .map(column_sql)
            .collect::<Result<Vec<_>, _>>()?;

        for name in report.duplicate_output_names() {
            warn!(column = %name, "Several selected columns share a result name, rows keep the last one");
        }

        let joins = if tables.len() > 1 {
            report
                .joins
                .iter()
                .map(join_sql)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            if !report.joins.is_empty() {
                debug!(
                    joins = report.joins.len(),
                    "Ignoring joins for single-table report"
                );
            }
            Vec::new()
        };

        let mut params = Vec::new();
        let mut conditions = Vec::new();
        for filter in &report.filters {
            if let Some(condition) = self.filter_sql(filter, &mut params)? {
                conditions.push(condition);
            }
        }

        let group_by = report
            .group_by
            .iter()
            .map(group_by_sql)
            .collect::<Result<Vec<_>, _>>()?;

        let order_by = report
            .order_by
            .iter()
            .map(order_by_sql)
            .collect::<Result<Vec<_>, _>>()?;

        let limit = report
            .limit
            .as_ref()
            .map(|l| self.parse_limit(l))
            .transpose()?;

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), tables[0].quoted());

        for join in &joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        debug!(sql = %sql, params = params.len(), "Compiled report query");

        Ok(CompiledQuery { sql, params })
    }

    fn filter_sql(
        &self,
        filter: &FilterSpec,
        params: &mut Vec<SqlValue>,
    ) -> Result<Option<String>, ValidationError> {
        let column = QualifiedColumn::parse(&filter.table, &filter.column)?;
        let op = self.resolve_operator(filter.operator.as_deref())?;
        let lhs = column.quoted();

        match op {
            FilterOperator::In => {
                let items = filter.value.as_array().ok_or_else(|| {
                    ValidationError::filter_value(column.to_string(), "IN requires an array value")
                })?;
                if items.is_empty() {
                    debug!(column = %column, "Dropping IN filter with empty list");
                    return Ok(None);
                }
                let value = SqlValue::from_array(items)
                    .map_err(|message| ValidationError::filter_value(column.to_string(), message))?;
                params.push(value);
                Ok(Some(format!("{lhs} = ANY(${})", params.len())))
            }
            FilterOperator::Is | FilterOperator::IsNot => {
                if !filter.value.is_null() {
                    return Err(ValidationError::filter_value(
                        column.to_string(),
                        format!("{op} only accepts null"),
                    ));
                }
                Ok(Some(format!("{lhs} {op} NULL")))
            }
            _ => {
                let value = SqlValue::from_scalar(&filter.value).ok_or_else(|| {
                    ValidationError::filter_value(
                        column.to_string(),
                        format!("{op} does not accept an array"),
                    )
                })?;
                params.push(value);
                Ok(Some(format!("{lhs} {op} ${}", params.len())))
            }
        }
    }

    fn resolve_operator(&self, raw: Option<&str>) -> Result<FilterOperator, ValidationError> {
        let Some(raw) = raw else {
            return Ok(FilterOperator::Eq);
        };

        match FilterOperator::lookup(raw) {
            Some(op) => Ok(op),
            None if self.options.strict_operators => {
                Err(ValidationError::InvalidOperator(raw.to_string()))
            }
            None => {
                warn!(operator = %raw, "Unknown filter operator, using '='");
                Ok(FilterOperator::Eq)
            }
        }
    }

    fn parse_limit(&self, limit: &LimitValue) -> Result<u64, ValidationError> {
        let parsed = match limit {
            LimitValue::Number(n) => n.as_u64(),
            LimitValue::Text(s) => s.trim().parse::<u64>().ok(),
        };

        match parsed {
            Some(n) if (1..=self.options.max_limit).contains(&n) => Ok(n),
            _ => Err(ValidationError::InvalidLimit(format!(
                "expected an integer between 1 and {}, got {}",
                self.options.max_limit,
                match limit {
                    LimitValue::Number(n) => n.to_string(),
                    LimitValue::Text(s) => format!("{s:?}"),
                }
            ))),
        }
    }
}

fn column_sql(column: &ColumnRef) -> Result<String, ValidationError> {
    let qualified = QualifiedColumn::parse(&column.table, &column.column)?;
    let alias = column.alias.as_deref().map(Identifier::parse).transpose()?;

    match column.aggregate.as_deref() {
        Some(raw) => {
            let aggregate: Aggregate = raw.parse()?;
            let alias = alias.unwrap_or_else(|| qualified.column.clone());
            Ok(format!(
                "{} AS {}",
                aggregate.apply(&qualified.quoted()),
                alias.quoted()
            ))
        }
        None => Ok(match alias {
            Some(alias) => format!("{} AS {}", qualified.quoted(), alias.quoted()),
            None => qualified.quoted(),
        }),
    }
}

fn join_sql(join: &JoinSpec) -> Result<String, ValidationError> {
    let table = Identifier::parse(&join.table)?;
    let join_type = JoinType::normalize(join.join_type.as_deref());

    let condition = join
        .condition
        .as_deref()
        .map(JoinCondition::parse)
        .transpose()?;

    match (join_type, condition) {
        (JoinType::Cross, _) => Ok(format!("CROSS JOIN {}", table.quoted())),
        (join_type, Some(condition)) => Ok(format!(
            "{} JOIN {} ON {}",
            join_type.as_sql(),
            table.quoted(),
            condition.to_sql()
        )),
        (_, None) => Err(ValidationError::InvalidJoinCondition(format!(
            "missing condition for join on {table}"
        ))),
    }
}

fn column_reference(table: Option<&str>, column: &str) -> Result<String, ValidationError> {
    match table {
        Some(table) => Ok(QualifiedColumn::parse(table, column)?.quoted()),
        None => Ok(Identifier::parse(column)?.quoted()),
    }
}

fn group_by_sql(item: &GroupByItem) -> Result<String, ValidationError> {
    column_reference(item.table(), item.column())
}

fn order_by_sql(item: &OrderByItem) -> Result<String, ValidationError> {
    let column = column_reference(item.table(), item.column())?;
    let order = SortOrder::normalize(item.direction());
    Ok(format!("{column} {}", order.as_sql()))
}
