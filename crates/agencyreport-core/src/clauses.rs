//! Allow-listed SQL keywords used by report clauses.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Aggregate functions a report column may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    StringAgg,
}

impl Aggregate {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::StringAgg => "STRING_AGG",
        }
    }

    /// Wrap an already quoted column expression in this aggregate.
    pub fn apply(self, column_sql: &str) -> String {
        match self {
            Self::StringAgg => format!("STRING_AGG({column_sql}::text, ', ')"),
            other => format!("{}({column_sql})", other.as_sql()),
        }
    }
}

impl FromStr for Aggregate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Self::Count),
            "SUM" => Ok(Self::Sum),
            "AVG" => Ok(Self::Avg),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "STRING_AGG" => Ok(Self::StringAgg),
            _ => Err(ValidationError::InvalidAggregate(s.to_string())),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Join kinds. Anything outside the allow-list normalizes to `Inner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    /// Normalize a caller supplied join type, case-insensitively.
    ///
    /// This never fails: missing or unknown values become [`JoinType::Inner`].
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("LEFT") => Self::Left,
            Some("RIGHT") => Self::Right,
            Some("FULL") => Self::Full,
            Some("CROSS") => Self::Cross,
            _ => Self::Inner,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
        }
    }
}

/// Comparison operators accepted in report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    NotEqual,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    ILike,
    In,
    Is,
    IsNot,
}

impl FilterOperator {
    /// Look up an operator by its SQL spelling.
    ///
    /// Surrounding whitespace is ignored, runs of inner whitespace collapse
    /// to one space and keyword operators match case-insensitively.
    pub fn lookup(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<>" => Some(Self::NotEqual),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "LIKE" => Some(Self::Like),
            "ILIKE" => Some(Self::ILike),
            "IN" => Some(Self::In),
            "IS" => Some(Self::Is),
            "IS NOT" => Some(Self::IsNot),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::NotEqual => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::In => "IN",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `DESC` only on an exact case-insensitive match, `ASC` otherwise.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_parse() {
        assert_eq!("count".parse::<Aggregate>().unwrap(), Aggregate::Count);
        assert_eq!("SUM".parse::<Aggregate>().unwrap(), Aggregate::Sum);
        assert_eq!(
            "String_Agg".parse::<Aggregate>().unwrap(),
            Aggregate::StringAgg
        );
        assert_eq!(
            "MEDIAN".parse::<Aggregate>(),
            Err(ValidationError::InvalidAggregate("MEDIAN".into()))
        );
        assert!("COUNT(*)".parse::<Aggregate>().is_err());
    }

    #[test]
    fn test_aggregate_apply() {
        assert_eq!(Aggregate::Sum.apply("\"t\".\"c\""), "SUM(\"t\".\"c\")");
        assert_eq!(
            Aggregate::StringAgg.apply("\"t\".\"c\""),
            "STRING_AGG(\"t\".\"c\"::text, ', ')"
        );
    }

    #[test]
    fn test_join_type_normalize() {
        assert_eq!(JoinType::normalize(Some("full")), JoinType::Full);
        assert_eq!(JoinType::normalize(Some(" Left ")), JoinType::Left);
        assert_eq!(JoinType::normalize(Some("CROSS")), JoinType::Cross);
        assert_eq!(JoinType::normalize(Some("outer")), JoinType::Inner);
        assert_eq!(JoinType::normalize(Some("LEFT; DROP")), JoinType::Inner);
        assert_eq!(JoinType::normalize(None), JoinType::Inner);
    }

    #[test]
    fn test_filter_operator_lookup() {
        assert_eq!(FilterOperator::lookup("="), Some(FilterOperator::Eq));
        assert_eq!(FilterOperator::lookup("<>"), Some(FilterOperator::NotEqual));
        assert_eq!(FilterOperator::lookup("ilike"), Some(FilterOperator::ILike));
        assert_eq!(FilterOperator::lookup(" in "), Some(FilterOperator::In));
        assert_eq!(
            FilterOperator::lookup("is   not"),
            Some(FilterOperator::IsNot)
        );
        assert_eq!(FilterOperator::lookup("=="), None);
        assert_eq!(FilterOperator::lookup("BETWEEN"), None);
        assert_eq!(FilterOperator::lookup("= 1 OR 1"), None);
    }

    #[test]
    fn test_sort_order_normalize() {
        assert_eq!(SortOrder::normalize(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::normalize(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::normalize(Some("descending")), SortOrder::Asc);
        assert_eq!(SortOrder::normalize(Some(" desc")), SortOrder::Asc);
        assert_eq!(SortOrder::normalize(None), SortOrder::Asc);
    }
}
