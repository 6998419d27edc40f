//! Field-level comparison of incoming records against stored documents.

use serde_json::Value;

use crate::domain::Record;

/// Structural equality as canonical serialization sees it: object key order
/// is irrelevant, array order matters, numbers compare by value.
///
/// Two integers compare exactly; only a float on either side falls back to
/// `f64` comparison, so `10 == 10.0` but large integers never collapse.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if !x.is_f64() && !y.is_f64() => x == y,
        (Value::Number(x), Value::Number(y)) => {
            matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Names of incoming fields that are absent from `existing` or hold a
/// different value, in incoming order. Fields only in `existing` are ignored.
pub fn changed_fields(existing: &Record, incoming: &Record) -> Vec<String> {
    incoming
        .iter()
        .filter(|(field, value)| match existing.get(*field) {
            Some(current) => !values_equal(current, value),
            None => true,
        })
        .map(|(field, _)| field.clone())
        .collect()
}
