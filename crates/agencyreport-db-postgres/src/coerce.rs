//! Placeholder typing for text parameters.
//!
//! Parameters travel in binary with a declared type, so a text literal
//! compared against a DATE, UUID, enum or integer column has no matching
//! operator. Before such a query runs, it is prepared with every parameter
//! left untyped and PostgreSQL reports the type it expects at each
//! placeholder. Text and null parameters whose expected type is not textual
//! are then cast through text to that type.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use agencyreport_core::SqlValue;
use regex::{Captures, Regex};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::executor::Executor;
use sqlx_core::statement::Statement;
use sqlx_core::type_info::TypeInfo;
use sqlx_postgres::types::Oid;
use sqlx_postgres::{PgConnection, PgTypeInfo};
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"));

/// Expected types that accept a text parameter as is.
const TEXTUAL_TYPES: &[&str] = &["TEXT", "VARCHAR", "CHAR", "NAME", "UNKNOWN", "citext"];

/// Returns `true` when some parameter binds as text and may need a cast.
pub(crate) fn needs_coercion(params: &[SqlValue]) -> bool {
    params.iter().any(|p| source_type(p).is_some())
}

/// Rewrites `sql` so text parameters are cast to the types the server
/// expects at their placeholders. Returns `sql` unchanged when nothing
/// needs a cast.
pub(crate) async fn coerce_placeholders<'s>(
    conn: &mut PgConnection,
    sql: &'s str,
    params: &[SqlValue],
) -> Result<Cow<'s, str>, SqlxError> {
    // Distinct text so the untyped statement never shares a cache slot with
    // the typed one that executes.
    let untyped = format!("/* untyped */ {sql}");
    let expected: Vec<PgTypeInfo> = {
        let statement = (&mut *conn).prepare(&untyped).await?;
        match statement.parameters().and_then(|p| p.left()) {
            Some(types) => types.to_vec(),
            None => return Ok(Cow::Borrowed(sql)),
        }
    };

    let mut casts = HashMap::new();
    for (idx, (param, ty)) in params.iter().zip(&expected).enumerate() {
        let Some(source) = source_type(param) else {
            continue;
        };
        if is_textual(ty) {
            continue;
        }
        let Some(oid) = ty.oid() else {
            debug!(param = idx + 1, type_name = ty.name(), "Parameter type has no OID, binding as text");
            continue;
        };
        let target = format_type(conn, oid).await?;
        casts.insert(idx + 1, format!("::{source}::{target}"));
    }

    if casts.is_empty() {
        return Ok(Cow::Borrowed(sql));
    }
    debug!(casts = casts.len(), "Casting text parameters to column types");
    Ok(Cow::Owned(rewrite_placeholders(sql, &casts)))
}

fn source_type(param: &SqlValue) -> Option<&'static str> {
    match param {
        SqlValue::Text(_) | SqlValue::Null => Some("text"),
        SqlValue::TextArray(_) => Some("text[]"),
        _ => None,
    }
}

fn is_textual(ty: &PgTypeInfo) -> bool {
    let name = ty.name();
    let element = name.strip_suffix("[]").unwrap_or(name);
    TEXTUAL_TYPES.contains(&element)
}

/// Asks the server for the SQL spelling of a type, quoted and qualified as
/// needed.
async fn format_type(conn: &mut PgConnection, oid: Oid) -> Result<String, SqlxError> {
    sqlx_core::query_scalar::query_scalar::<_, String>("SELECT format_type($1, NULL)")
        .bind(oid)
        .fetch_one(&mut *conn)
        .await
}

/// Appends the cast for parameter `n` after each `$n` placeholder.
fn rewrite_placeholders(sql: &str, casts: &HashMap<usize, String>) -> String {
    PLACEHOLDER
        .replace_all(sql, |caps: &Captures<'_>| {
            let placeholder = &caps[0];
            match caps[1].parse::<usize>().ok().and_then(|n| casts.get(&n)) {
                Some(cast) => format!("{placeholder}{cast}"),
                None => placeholder.to_string(),
            }
        })
        .into_owned()
}
