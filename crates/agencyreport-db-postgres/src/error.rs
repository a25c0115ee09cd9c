//! Error types for the PostgreSQL tenant backend.

use agencyreport_runner::{ReportError, TenantId};
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for undefined table (42P01).
pub const PG_UNDEFINED_TABLE: &str = "42P01";

/// PostgreSQL error code for invalid catalog name, i.e. unknown database (3D000).
pub const PG_INVALID_CATALOG_NAME: &str = "3D000";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Checks if a sqlx error is "undefined table" (42P01).
pub fn is_undefined_table(err: &SqlxError) -> bool {
    has_pg_error_code(err, PG_UNDEFINED_TABLE)
}

/// Returns the store's own message for a sqlx error.
///
/// Database errors carry the server's message without sqlx's prefix; other
/// errors fall back to their display form.
pub fn store_message(err: &SqlxError) -> String {
    match err {
        SqlxError::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}

/// Errors specific to the PostgreSQL tenant backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx_core::error::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Pool error.
    #[error("Pool error: {message}")]
    Pool { message: String },

    /// The tenant is not served by this router.
    #[error("Invalid tenant {tenant}: {message}")]
    InvalidTenant { tenant: String, message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new pool error.
    #[must_use]
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool {
            message: message.into(),
        }
    }

    /// Creates a new invalid tenant error.
    #[must_use]
    pub fn invalid_tenant(tenant: &TenantId, message: impl Into<String>) -> Self {
        Self::InvalidTenant {
            tenant: tenant.to_string(),
            message: message.into(),
        }
    }

    /// Converts this error into a [`ReportError`] for the given tenant.
    ///
    /// Everything that prevents handing out a connection surfaces as
    /// [`ReportError::ConnectionUnavailable`].
    pub fn into_report_error(self, tenant: &TenantId) -> ReportError {
        let message = match self {
            Self::Connection(e) => store_message(&e),
            Self::Config { message } | Self::Pool { message } => message,
            Self::InvalidTenant { message, .. } => message,
        };
        ReportError::connection_unavailable(tenant.as_str(), message)
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
