//! Error types for report execution.

use agencyreport_core::{CompileError, ValidationError};

/// Errors that can occur while compiling, executing or rendering a report.
///
/// Validation and configuration failures are raised before any connection
/// is acquired. Store messages in [`ReportError::Execution`] are passed
/// through verbatim and are never used to build new query text.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report definition is malformed or missing required fields.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A report field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No connection could be obtained for the tenant.
    #[error("Connection unavailable for tenant {tenant}: {message}")]
    ConnectionUnavailable {
        /// The tenant whose database was requested.
        tenant: String,
        /// Description of the failure.
        message: String,
    },

    /// The database rejected or failed the query.
    #[error("Execution error: {message}")]
    Execution {
        /// The store's error message.
        message: String,
    },

    /// Serializing the result failed.
    #[error("Output error: {message}")]
    Output {
        /// Description of the failure.
        message: String,
    },

    /// The requested output format is not known or not rendered here.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

impl ReportError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionUnavailable` error.
    #[must_use]
    pub fn connection_unavailable(tenant: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            tenant: tenant.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Execution` error.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Creates a new `Output` error.
    #[must_use]
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure happened before touching the database.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Validation(_) | Self::UnsupportedFormat(_)
        )
    }
}

impl From<CompileError> for ReportError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Configuration(message) => Self::Configuration { message },
            CompileError::Validation(e) => Self::Validation(e),
        }
    }
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::connection_unavailable("agency_1", "pool timed out");
        assert_eq!(
            err.to_string(),
            "Connection unavailable for tenant agency_1: pool timed out"
        );

        let err = ReportError::execution("relation \"nope\" does not exist");
        assert!(err.to_string().contains("relation \"nope\" does not exist"));
    }

    #[test]
    fn test_compile_error_conversion() {
        let err: ReportError = CompileError::configuration("no tables").into();
        assert!(matches!(err, ReportError::Configuration { .. }));
        assert!(err.is_client_error());

        let err: ReportError =
            CompileError::Validation(ValidationError::InvalidLimit("0".into())).into();
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        assert!(!ReportError::execution("boom").is_client_error());
        assert!(!ReportError::connection_unavailable("t", "down").is_client_error());
    }
}
