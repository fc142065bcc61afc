//! Field formatter: (raw field, column descriptor) -> text.
//!
//! Precedence:
//! 1. explicit null  -> `null` when the column is nullable, empty otherwise
//! 2. absent         -> empty, whatever `nullable` says
//! 3. type coercion  -> see the per-type helpers below
//!
//! Coercion never fails. A value that cannot be coerced degrades to an empty
//! field so one bad value cannot take the stream down.
//!
//! String fields are wrapped in double quotes without escaping embedded
//! quotes or delimiters.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::schema::{ColumnDescriptor, ColumnType};
use crate::types::{FieldRef, Value};

/// Literal written for an explicit null in a nullable column.
pub const NULL_LITERAL: &str = "null";

/// Format one field into a fresh string.
pub fn format_field(field: FieldRef<'_>, column: &ColumnDescriptor) -> String {
    let mut out = String::new();
    write_field(&mut out, field, column);
    out
}

/// Append one formatted field to `out`.
pub fn write_field(out: &mut String, field: FieldRef<'_>, column: &ColumnDescriptor) {
    let value = match field {
        FieldRef::Null => {
            if column.nullable {
                out.push_str(NULL_LITERAL);
            }
            return;
        }
        FieldRef::Absent => return,
        FieldRef::Value(Value::Null) => {
            // Not produced by `Record::get`, but handle it the same way.
            if column.nullable {
                out.push_str(NULL_LITERAL);
            }
            return;
        }
        FieldRef::Value(v) => v,
    };

    match column.column_type {
        ColumnType::String => write_string(out, value),
        ColumnType::Number => write_number(out, value),
        ColumnType::Boolean => write_boolean(out, value),
        ColumnType::Date => write_date(out, value, &column.name),
    }
}

fn write_string(out: &mut String, value: &Value) {
    if !value.is_truthy() {
        return;
    }
    out.push('"');
    match value {
        Value::Str(s) => out.push_str(s),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::I64(i) => {
            let _ = write!(out, "{i}");
        }
        Value::F64(f) => out.push_str(&number_text(*f)),
        Value::Date(d) => out.push_str(&canonical_date(d)),
        Value::Null => {}
    }
    out.push('"');
}

fn write_number(out: &mut String, value: &Value) {
    match value {
        Value::I64(i) => {
            let _ = write!(out, "{i}");
        }
        Value::F64(f) if f.is_finite() => out.push_str(&number_text(*f)),
        Value::F64(_) => {}
        Value::Str(s) => {
            if let Some(f) = parse_number(s) {
                out.push_str(&number_text(f));
            }
        }
        Value::Bool(b) => out.push(if *b { '1' } else { '0' }),
        Value::Date(d) => {
            let _ = write!(out, "{}", d.timestamp_millis());
        }
        Value::Null => {}
    }
}

fn write_boolean(out: &mut String, value: &Value) {
    if value.is_truthy() {
        out.push('1');
        return;
    }
    match value {
        Value::Bool(false) | Value::I64(0) => out.push('0'),
        Value::F64(f) if *f == 0.0 => out.push('0'),
        _ => {}
    }
}

fn write_date(out: &mut String, value: &Value, column: &str) {
    if !value.is_truthy() {
        return;
    }
    match coerce_date(value) {
        Some(d) => out.push_str(&canonical_date(&d)),
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!(column, ?value, "value is not a date; writing empty field");
            #[cfg(not(feature = "tracing"))]
            let _ = column;
        }
    }
}

/// Canonical date text: RFC 3339, UTC, millisecond precision, `Z` suffix.
pub fn canonical_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Interpret a value as a point in time. Numbers are epoch milliseconds.
pub fn coerce_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::I64(ms) => DateTime::from_timestamp_millis(*ms),
        Value::F64(ms) if ms.is_finite() => DateTime::from_timestamp_millis(ms.trunc() as i64),
        Value::Str(s) => parse_date(s),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Shortest decimal text; integral values print without a fraction.
fn number_text(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{f:.0}")
    } else {
        format!("{f}")
    }
}
