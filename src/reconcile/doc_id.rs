//! Key value handling and document id derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::tabular::value_to_cell;

static RESERVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\#,+()$~%.'":*?<>{}]"#).expect("valid reserved-char regex"));

/// Replace every storage-reserved character with `_`.
///
/// Distinct keys may collide after sanitizing; that is not detected.
pub fn sanitize_doc_id(raw: &str) -> String {
    RESERVED_RE.replace_all(raw, "_").into_owned()
}

/// True for values that cannot identify a document: null, `false`, zero,
/// and the empty string.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0 || f.is_nan()).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Text form of a key value before sanitizing, following JavaScript's
/// `String(value)`. Whole floats print without a fractional part so `10.0`
/// and `10` address the same document; arrays join their elements with `,`
/// and every object prints as `[object Object]`.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => value_to_cell(value),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| if item.is_null() { String::new() } else { key_text(item) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        _ => value_to_cell(value),
    }
}

/// Derive the stored document id for a key value.
pub fn doc_id_for(value: &Value) -> String {
    sanitize_doc_id(&key_text(value))
}
