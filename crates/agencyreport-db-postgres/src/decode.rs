//! Row decoding from PostgreSQL into JSON values.
//!
//! Columns are decoded by their PostgreSQL type. Enums and text domains come
//! back as strings; a column type with no JSON mapping is an error rather
//! than a silent `null`.

use std::collections::HashSet;

use agencyreport_runner::Row;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx_core::column::Column;
use sqlx_core::decode::Decode;
use sqlx_core::row::Row as _;
use sqlx_core::type_info::TypeInfo;
use sqlx_core::types::Type;
use sqlx_postgres::types::{PgInterval, PgMoney};
use sqlx_postgres::{PgRow, PgTypeInfo, PgTypeKind, Postgres};
use tracing::warn;
use uuid::Uuid;

/// Largest number of significant digits a NUMERIC may have and still be
/// emitted as a JSON float.
const MAX_FLOAT_DIGITS: u64 = 15;

/// Fractional digits assumed for MONEY values.
const MONEY_FRAC_DIGITS: i64 = 2;

/// Decodes a row into an ordered map of column name to value.
///
/// Result columns sharing a name collapse into one key holding the last
/// value, in the position of the first.
///
/// # Errors
///
/// Returns a message naming the column when a value cannot be decoded or its
/// type has no JSON mapping.
pub fn decode_row(row: &PgRow) -> Result<Row, String> {
    let mut decoded = Row::with_capacity(row.len());
    for col in row.columns() {
        let value = decode_column(row, col.ordinal(), col.type_info())
            .map_err(|e| format!("cannot decode column \"{}\": {e}", col.name()))?;
        decoded.insert(col.name().to_string(), value);
    }
    Ok(decoded)
}

/// Logs result column names that appear more than once, since only the last
/// of them survives decoding.
pub(crate) fn warn_duplicate_columns(row: Option<&PgRow>) {
    let Some(row) = row else {
        return;
    };
    let mut seen = HashSet::new();
    for col in row.columns() {
        if !seen.insert(col.name()) {
            warn!(column = col.name(), "Duplicate result column name, earlier value is dropped");
        }
    }
}

fn decode_column(row: &PgRow, idx: usize, ty: &PgTypeInfo) -> Result<Value, String> {
    match ty.kind() {
        PgTypeKind::Enum(_) => return Ok(get::<String>(row, idx)?.map_or(Value::Null, Value::String)),
        PgTypeKind::Domain(base) => return decode_column(row, idx, base),
        PgTypeKind::Array(element) if matches!(element.kind(), PgTypeKind::Enum(_)) => {
            return array::<String>(row, idx, Value::String);
        }
        _ => {}
    }

    let value = match ty.name() {
        "BOOL" => get::<bool>(row, idx)?.map(Value::Bool),
        "INT2" => get::<i16>(row, idx)?.map(Value::from),
        "INT4" => get::<i32>(row, idx)?.map(Value::from),
        "INT8" => get::<i64>(row, idx)?.map(Value::from),
        "FLOAT4" => get::<f32>(row, idx)?.map(|f| Value::from(f64::from(f))),
        "FLOAT8" => get::<f64>(row, idx)?.map(Value::from),
        "NUMERIC" => get::<BigDecimal>(row, idx)?.map(numeric_to_json),
        "MONEY" => get::<PgMoney>(row, idx)?
            .map(|m| numeric_to_json(m.to_bigdecimal(MONEY_FRAC_DIGITS))),
        "JSON" | "JSONB" => get::<Value>(row, idx)?,
        "UUID" => get::<Uuid>(row, idx)?.map(|u| Value::String(u.to_string())),
        "DATE" => get::<NaiveDate>(row, idx)?.map(|d| Value::String(d.to_string())),
        "TIME" => get::<NaiveTime>(row, idx)?.map(|t| Value::String(t.to_string())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx)?.map(timestamp_to_json),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx)?.map(|ts| Value::String(ts.to_rfc3339())),
        "INTERVAL" => get::<PgInterval>(row, idx)?.map(|i| Value::String(interval_to_iso(&i))),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "UNKNOWN" | "citext" => {
            get::<String>(row, idx)?.map(Value::String)
        }
        "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => Some(array::<String>(row, idx, Value::String)?),
        "INT2[]" => Some(array::<i16>(row, idx, Value::from)?),
        "INT4[]" => Some(array::<i32>(row, idx, Value::from)?),
        "INT8[]" => Some(array::<i64>(row, idx, Value::from)?),
        "FLOAT4[]" => Some(array::<f32>(row, idx, |f| Value::from(f64::from(f)))?),
        "FLOAT8[]" => Some(array::<f64>(row, idx, Value::from)?),
        "BOOL[]" => Some(array::<bool>(row, idx, Value::Bool)?),
        "NUMERIC[]" => Some(array::<BigDecimal>(row, idx, numeric_to_json)?),
        "UUID[]" => Some(array::<Uuid>(row, idx, |u| Value::String(u.to_string()))?),
        "DATE[]" => Some(array::<NaiveDate>(row, idx, |d| Value::String(d.to_string()))?),
        "TIMESTAMPTZ[]" => Some(array::<DateTime<Utc>>(row, idx, |ts| {
            Value::String(ts.to_rfc3339())
        })?),
        other => return Err(format!("unsupported column type {other}")),
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Reads a nullable value without sqlx's type-compatibility check; the
/// caller has already matched the column type.
fn get<'r, T>(row: &'r PgRow, idx: usize) -> Result<Option<T>, String>
where
    T: Decode<'r, Postgres>,
{
    row.try_get_unchecked::<Option<T>, _>(idx)
        .map_err(|e| e.to_string())
}

/// Reads an array column, keeping `null` elements.
fn array<T>(row: &PgRow, idx: usize, convert: impl Fn(T) -> Value) -> Result<Value, String>
where
    T: for<'a> Decode<'a, Postgres> + Type<Postgres>,
{
    Ok(match get::<Vec<Option<T>>>(row, idx)? {
        Some(items) => Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(Value::Null, &convert))
                .collect(),
        ),
        None => Value::Null,
    })
}

fn timestamp_to_json(ts: NaiveDateTime) -> Value {
    Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Formats an interval as an ISO 8601 duration, e.g. `P1Y2M3DT4H5M6.5S`.
pub(crate) fn interval_to_iso(interval: &PgInterval) -> String {
    let mut out = String::from("P");
    let (years, months) = (interval.months / 12, interval.months % 12);
    for (amount, unit) in [(years, 'Y'), (months, 'M'), (interval.days, 'D')] {
        if amount != 0 {
            out.push_str(&format!("{amount}{unit}"));
        }
    }

    let micros = interval.microseconds;
    if micros != 0 {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let hours = abs / 3_600_000_000;
        let minutes = abs / 60_000_000 % 60;
        let seconds = abs / 1_000_000 % 60;
        let fraction = abs % 1_000_000;

        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{sign}{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{sign}{minutes}M"));
        }
        if seconds != 0 || fraction != 0 {
            out.push_str(&format!("{sign}{seconds}"));
            if fraction != 0 {
                let digits = format!("{fraction:06}");
                out.push('.');
                out.push_str(digits.trim_end_matches('0'));
            }
            out.push('S');
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

/// Converts a NUMERIC into JSON.
///
/// Integers that fit `i64` and decimals with few enough digits become JSON
/// numbers. Anything wider is emitted as a string to keep every digit.
pub fn numeric_to_json(value: BigDecimal) -> Value {
    if value.is_integer()
        && let Some(i) = value.to_i64()
    {
        return Value::from(i);
    }
    if value.digits() <= MAX_FLOAT_DIGITS
        && let Some(n) = value.to_f64().and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(value.to_string())
}
