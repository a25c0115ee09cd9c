//! Tenant identity and the connection seam between the runner and a store.
//!
//! Every report runs against exactly one tenant's database. The runner never
//! holds a database handle of its own; it asks a [`TenantRouter`] for a
//! [`TenantConnection`] scoped to the tenant, uses it for a single query and
//! hands it back.

use std::fmt;

use agencyreport_core::CompiledQuery;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReportError, Result};

/// Maximum length of a tenant identifier.
pub const MAX_TENANT_ID_LEN: usize = 63;

/// One result row: column name to value, in select-list order.
pub type Row = IndexMap<String, Value>;

/// All rows returned by a single query.
pub type RowSet = Vec<Row>;

/// Validated tenant (agency) identifier.
///
/// Tenant ids end up in database names and log fields, so they are
/// restricted to ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parses and validates a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Configuration`] if the id is empty, too long or
    /// contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_TENANT_ID_LEN {
            return Err(ReportError::configuration(format!(
                "tenant id must be 1-{MAX_TENANT_ID_LEN} characters"
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ReportError::configuration(format!(
                "invalid tenant id: {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for TenantId {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Hands out connections scoped to a single tenant's database.
///
/// Implementations must never return a connection that can see another
/// tenant's data.
#[async_trait]
pub trait TenantRouter: Send + Sync {
    /// Acquires a connection to the tenant's database.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ConnectionUnavailable`] if the tenant is unknown
    /// or its database cannot be reached.
    async fn acquire(&self, tenant: &TenantId) -> Result<Box<dyn TenantConnection>>;
}

/// A connection checked out from a [`TenantRouter`].
#[async_trait]
pub trait TenantConnection: Send {
    /// Executes a compiled query, binding `query.params` positionally.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Execution`] carrying the store's message.
    async fn execute(&mut self, query: &CompiledQuery) -> Result<RowSet>;

    /// Returns the connection to its pool.
    ///
    /// Called exactly once per acquired connection, whether or not
    /// [`execute`](Self::execute) succeeded. Must be safe to call again.
    async fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_accepts_common_forms() {
        for id in ["agency_1", "north-region", "ACME", "0042"] {
            assert_eq!(TenantId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_tenant_id_rejects_unsafe_values() {
        let too_long = "a".repeat(MAX_TENANT_ID_LEN + 1);
        for id in ["", "a b", "a;b", "a/b", "../etc", "a\"b", too_long.as_str()] {
            assert!(TenantId::new(id).is_err(), "{id:?} should be rejected");
        }
    }

    #[test]
    fn test_tenant_id_serde() {
        let id: TenantId = serde_json::from_str("\"agency_7\"").unwrap();
        assert_eq!(id.to_string(), "agency_7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"agency_7\"");
        assert!(serde_json::from_str::<TenantId>("\"bad id\"").is_err());
    }
}
