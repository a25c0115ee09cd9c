//! Identifier validation and quoting.
//!
//! Table, column and alias names cannot be bound as parameters, so they are
//! embedded directly into the query text. Every such name must first pass
//! [`Identifier::parse`]; only the resulting [`Identifier`] can be quoted.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Longest accepted identifier in bytes (PostgreSQL truncates at NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A bare SQL identifier that passed structural validation.
///
/// Dotted or otherwise multi-part names are never accepted; a qualified
/// reference is always built from two separately validated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `name` against the identifier grammar.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the name is empty,
    /// too long, or contains anything but ASCII letters, digits and
    /// underscores (or starts with a digit).
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render this identifier in double quotes for embedding in SQL.
    pub fn quoted(&self) -> String {
        quote_identifier(self)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check `name` against the identifier grammar without allocating.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIdentifier`] on any violation.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN || !IDENTIFIER_RE.is_match(name) {
        return Err(ValidationError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Quote a validated identifier, doubling any embedded quote character.
pub fn quote_identifier(ident: &Identifier) -> String {
    debug_assert!(validate_identifier(ident.as_str()).is_ok());
    format!("\"{}\"", ident.0.replace('"', "\"\""))
}

/// A `table.column` pair built from two validated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedColumn {
    pub table: Identifier,
    pub column: Identifier,
}

impl QualifiedColumn {
    /// Validate both parts of a qualified column reference.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] for the first invalid part.
    pub fn parse(table: &str, column: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            table: Identifier::parse(table)?,
            column: Identifier::parse(column)?,
        })
    }

    /// Render as `"table"."column"`.
    pub fn quoted(&self) -> String {
        format!("{}.{}", self.table.quoted(), self.column.quoted())
    }
}

impl fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["id", "_private", "Projects", "col_2", "a", "_", "x9_y"] {
            assert!(Identifier::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in [
            "",
            "1abc",
            "projects.id",
            "id; DROP TABLE x",
            "name\"",
            "with space",
            "dash-ed",
            "ünïcode",
            "tab\t",
            "semi;",
        ] {
            assert_eq!(
                Identifier::parse(name),
                Err(ValidationError::InvalidIdentifier(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_length_bound() {
        let at_limit = "a".repeat(MAX_IDENTIFIER_LEN);
        assert!(Identifier::parse(&at_limit).is_ok());

        let too_long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(Identifier::parse(&too_long).is_err());
    }

    #[test]
    fn test_trailing_newline_rejected() {
        // `$` in the pattern must not match before a trailing newline
        assert!(Identifier::parse("id\n").is_err());
    }

    #[test]
    fn test_quoting_is_deterministic() {
        let a = Identifier::parse("status").unwrap();
        let b = Identifier::parse("status").unwrap();
        assert_eq!(a.quoted(), "\"status\"");
        assert_eq!(a.quoted(), b.quoted());
        assert_ne!(a.quoted(), Identifier::parse("Status").unwrap().quoted());
    }

    #[test]
    fn test_qualified_column() {
        let col = QualifiedColumn::parse("projects", "id").unwrap();
        assert_eq!(col.quoted(), "\"projects\".\"id\"");
        assert_eq!(col.to_string(), "projects.id");

        assert!(QualifiedColumn::parse("projects", "id; --").is_err());
        assert!(QualifiedColumn::parse("a.b", "id").is_err());
    }
}
