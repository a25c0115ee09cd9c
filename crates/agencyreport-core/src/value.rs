//! Bound parameter values.

use serde::Serialize;
use serde_json::Value;

/// SQL value types for parameterized queries.
///
/// Arrays are homogeneous so they can be bound as a single typed PostgreSQL
/// array for `= ANY($n)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Json(Value),
    TextArray(Vec<String>),
    IntegerArray(Vec<i64>),
    FloatArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    Null,
}

impl SqlValue {
    /// Convert a JSON filter value into a scalar parameter.
    ///
    /// Returns `None` for arrays, which are only valid for `IN`.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => number_value(n),
            Value::String(s) => Self::Text(s.clone()),
            Value::Object(_) => Self::Json(value.clone()),
            Value::Array(_) => return None,
        })
    }

    /// Convert a non-empty JSON array of scalars into a typed array parameter.
    ///
    /// Integer-only arrays stay integers, mixed numeric arrays become floats,
    /// and arrays mixing strings with other scalars fall back to text.
    ///
    /// # Errors
    ///
    /// Returns a message if an element is null, an array or an object.
    pub fn from_array(items: &[Value]) -> Result<Self, String> {
        if let Some(bad) = items
            .iter()
            .find(|v| v.is_null() || v.is_array() || v.is_object())
        {
            return Err(format!("IN list elements must be scalars, found {bad}"));
        }

        if items.iter().all(Value::is_boolean) {
            return Ok(Self::BooleanArray(
                items.iter().filter_map(Value::as_bool).collect(),
            ));
        }

        if items.iter().all(|v| v.is_i64()) {
            return Ok(Self::IntegerArray(
                items.iter().filter_map(Value::as_i64).collect(),
            ));
        }

        if items.iter().all(Value::is_number) {
            return Ok(Self::FloatArray(
                items.iter().filter_map(Value::as_f64).collect(),
            ));
        }

        Ok(Self::TextArray(
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ))
    }

    /// Get the value as a string for display/debugging.
    pub fn as_display_str(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Json(v) => v.to_string(),
            Self::TextArray(items) => format!("{{{}}}", items.join(",")),
            Self::IntegerArray(items) => join_display(items),
            Self::FloatArray(items) => join_display(items),
            Self::BooleanArray(items) => join_display(items),
            Self::Null => "NULL".to_string(),
        }
    }
}

fn number_value(n: &serde_json::Number) -> SqlValue {
    if let Some(i) = n.as_i64() {
        SqlValue::Integer(i)
    } else {
        SqlValue::Float(n.as_f64().unwrap_or_default())
    }
}

fn join_display<T: ToString>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("{{{}}}", parts.join(","))
}
