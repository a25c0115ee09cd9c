//! Error types for report compilation.

use thiserror::Error;

/// A field of a [`ReportConfig`](crate::ReportConfig) failed structural validation.
///
/// Validation errors are raised before any database interaction and never
/// carry partially built query text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid aggregate function: {0:?}")]
    InvalidAggregate(String),

    #[error("Invalid join condition: {0:?}")]
    InvalidJoinCondition(String),

    #[error("Invalid filter operator: {0:?}")]
    InvalidOperator(String),

    #[error("Invalid value for filter on {column}: {message}")]
    InvalidFilterValue { column: String, message: String },

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}

impl ValidationError {
    #[must_use]
    pub fn filter_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by [`QueryCompiler::compile`](crate::QueryCompiler::compile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Required report fields are missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An identifier, aggregate, join condition, operator, value or limit was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CompileError {
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` if this error came from field validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::configuration("tables must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: tables must not be empty"
        );

        let err: CompileError = ValidationError::InvalidIdentifier("a b".into()).into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Invalid identifier"));
    }

    #[test]
    fn test_filter_value_helper() {
        let err = ValidationError::filter_value("status", "expected an array");
        assert_eq!(
            err.to_string(),
            "Invalid value for filter on status: expected an array"
        );
    }
}
