//! Optional per-field value coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Number, Value};
use std::collections::BTreeMap;
use tracing::warn;

use super::header::looks_numeric;
use crate::domain::{FieldType, Record};
use crate::tabular::value_to_cell;

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn text_of(value: &Value) -> String {
    value_to_cell(value)
}

/// Whether `value` can be represented as `field_type`. Blank values always can.
pub fn can_convert(value: &Value, field_type: FieldType) -> bool {
    if is_blank(value) {
        return true;
    }
    match field_type {
        FieldType::String => true,
        FieldType::Number => to_number(value).is_some(),
        FieldType::Boolean => {
            matches!(text_of(value).to_lowercase().as_str(), "true" | "false" | "1" | "0" | "yes" | "no")
        }
        FieldType::Array => match value {
            Value::Array(_) => true,
            Value::String(s) => s.starts_with('[') && s.ends_with(']') && serde_json::from_str::<Value>(s).is_ok(),
            _ => false,
        },
        FieldType::Object => match value {
            Value::Object(_) => true,
            Value::String(s) => s.starts_with('{') && s.ends_with('}') && serde_json::from_str::<Value>(s).is_ok(),
            _ => false,
        },
        FieldType::Date => to_date(value).is_some(),
    }
}

/// Convert `value` to `field_type`. Blank values become null.
///
/// Numbers and dates that cannot be parsed are returned unchanged; callers
/// check `can_convert` first when they need to know.
pub fn convert(value: &Value, field_type: FieldType) -> Value {
    if is_blank(value) {
        return Value::Null;
    }
    match field_type {
        FieldType::String => Value::String(text_of(value)),
        FieldType::Number => to_number(value).map(Value::Number).unwrap_or_else(|| value.clone()),
        FieldType::Boolean => {
            Value::Bool(matches!(text_of(value).to_lowercase().as_str(), "true" | "1" | "yes"))
        }
        FieldType::Array => match value {
            Value::Array(_) => value.clone(),
            Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!([value])),
            _ => json!([value]),
        },
        FieldType::Object => match value {
            Value::Object(_) => value.clone(),
            Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({ "value": value })),
            _ => json!({ "value": value }),
        },
        FieldType::Date => to_date(value)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .unwrap_or_else(|| value.clone()),
    }
}

fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::Bool(b) => Some(Number::from(u8::from(*b))),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if !looks_numeric(trimmed) {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return i64::from_str_radix(&trimmed[2..], radix).ok().map(Number::from);
    }
    if !lower.contains(['.', 'e']) {
        if let Ok(int) = trimmed.trim_start_matches('+').parse::<i64>() {
            return Some(Number::from(int));
        }
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Apply configured field types to every record in place.
///
/// Values that cannot be converted are kept as-is and counted.
pub fn coerce_records(records: &mut [Record], field_types: &BTreeMap<String, FieldType>) -> usize {
    if field_types.is_empty() {
        return 0;
    }
    let mut rejected = 0usize;
    for (row, record) in records.iter_mut().enumerate() {
        for (field, field_type) in field_types {
            let Some(value) = record.get_mut(field) else {
                continue;
            };
            if can_convert(value, *field_type) {
                *value = convert(value, *field_type);
            } else {
                rejected += 1;
                warn!(row, field = %field, value = %value, "value cannot be converted to {:?}", field_type);
            }
        }
    }
    rejected
}
