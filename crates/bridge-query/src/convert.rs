//! Value conversion between native values and engine JSON.
//!
//! The engine stores everything as JSON; dates travel as formatted
//! strings. Conversion back prefers the field's declared kind and falls
//! back to shape-based guessing for undeclared fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};

use bridge_types::value::{ENGINE_DATETIME_FORMAT, ENGINE_DATE_FORMAT};
use bridge_types::{FieldValue, ValueKind};

/// Convert a native value to its engine representation.
pub fn to_engine(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => json!(s),
        FieldValue::Integer(v) => json!(v),
        FieldValue::Float(v) => json!(v),
        FieldValue::Boolean(v) => json!(v),
        FieldValue::DateTime(dt) => json!(dt.format(ENGINE_DATETIME_FORMAT).to_string()),
        FieldValue::Date(d) => json!(d.format(ENGINE_DATE_FORMAT).to_string()),
        FieldValue::Null => Value::Null,
        FieldValue::Multiple(values) => Value::Array(values.iter().map(to_engine).collect()),
    }
}

/// Generic engine-to-native conversion for fields with no declared kind.
///
/// Strings that parse as engine dates come back as dates; everything else
/// keeps its JSON shape.
pub fn from_engine(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(v) => FieldValue::Boolean(*v),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                FieldValue::Integer(v)
            } else {
                FieldValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => parse_date_string(s).unwrap_or_else(|| FieldValue::Text(s.clone())),
        Value::Array(values) => FieldValue::Multiple(values.iter().map(from_engine).collect()),
        Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

/// Convert a stored engine value back using the field's declared kind.
pub fn convert_for_field(kind: ValueKind, value: &Value) -> FieldValue {
    if let Value::Array(values) = value {
        return FieldValue::Multiple(
            values.iter().map(|v| convert_for_field(kind, v)).collect(),
        );
    }
    if value.is_null() {
        return FieldValue::Null;
    }

    match kind {
        ValueKind::Integer => value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(FieldValue::Integer)
            .unwrap_or_else(|| from_engine(value)),
        ValueKind::Float => value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(FieldValue::Float)
            .unwrap_or_else(|| from_engine(value)),
        ValueKind::Boolean => value
            .as_bool()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(FieldValue::Boolean)
            .unwrap_or_else(|| from_engine(value)),
        ValueKind::Date => value
            .as_str()
            .and_then(parse_naive_date)
            .map(FieldValue::Date)
            .unwrap_or_else(|| from_engine(value)),
        ValueKind::DateTime => value
            .as_str()
            .and_then(parse_naive_datetime)
            .map(FieldValue::DateTime)
            .unwrap_or_else(|| from_engine(value)),
        ValueKind::Text
        | ValueKind::Ngram
        | ValueKind::EdgeNgram
        | ValueKind::Decimal
        | ValueKind::Location => match value {
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        },
    }
}

fn parse_date_string(s: &str) -> Option<FieldValue> {
    if let Some(dt) = parse_naive_datetime(s) {
        return Some(FieldValue::DateTime(dt));
    }
    parse_naive_date(s).map(FieldValue::Date)
}

fn parse_naive_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, ENGINE_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_naive_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, ENGINE_DATE_FORMAT).ok()
}
