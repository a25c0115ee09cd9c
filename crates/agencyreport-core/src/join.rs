//! Join condition sanitizing.
//!
//! Join predicates are structural and cannot be bound as parameters. The only
//! accepted shape is an equality between two qualified columns; the parsed
//! parts are re-quoted individually and the raw text is discarded.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::identifier::QualifiedColumn;

static JOIN_CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^\s.=]+)\.([^\s.=]+)\s*=\s*([^\s.=]+)\.([^\s.=]+)\s*$")
        .expect("join condition pattern is valid")
});

/// A sanitized `left = right` join predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left: QualifiedColumn,
    pub right: QualifiedColumn,
}

impl JoinCondition {
    /// Parse `table.column = table.column`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidJoinCondition`] if the text does not
    /// have exactly that shape or if any of the four parts is not a valid
    /// identifier.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidJoinCondition(raw.to_string());

        let caps = JOIN_CONDITION_RE.captures(raw).ok_or_else(invalid)?;
        let left = QualifiedColumn::parse(&caps[1], &caps[2]).map_err(|_| invalid())?;
        let right = QualifiedColumn::parse(&caps[3], &caps[4]).map_err(|_| invalid())?;

        Ok(Self { left, right })
    }

    /// Render as `"a"."x" = "b"."y"`.
    pub fn to_sql(&self) -> String {
        format!("{} = {}", self.left.quoted(), self.right.quoted())
    }
}

/// Validate a raw join condition. Alias for [`JoinCondition::parse`].
///
/// # Errors
///
/// See [`JoinCondition::parse`].
pub fn validate_join_condition(raw: &str) -> Result<JoinCondition, ValidationError> {
    JoinCondition::parse(raw)
}
