//! Header detection and positional record assembly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Record, ResolvedTable, Table};
use crate::error::{Result, UpsertError};

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid decimal regex")
});
static RADIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0(?:[xX][0-9a-fA-F]+|[oO][0-7]+|[bB][01]+)$").expect("valid radix regex")
});

/// True when the whole trimmed cell reads as a number (JavaScript `Number()` rules).
/// Blank cells are not numeric.
pub fn looks_numeric(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return false;
    }
    matches!(trimmed, "Infinity" | "+Infinity" | "-Infinity")
        || DECIMAL_RE.is_match(trimmed)
        || RADIX_RE.is_match(trimmed)
}

/// Whether row 0 looks like a header row: more non-numeric than numeric cells.
/// Tables with fewer than two rows never have headers.
pub fn has_headers(table: &Table) -> bool {
    if table.len() < 2 {
        return false;
    }
    let first = &table.rows[0];
    let numeric = first.iter().filter(|cell| looks_numeric(cell)).count();
    let text = first.len() - numeric;
    text > numeric
}

/// `Column1`, `Column2`, ...
pub fn placeholder_headers(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("Column{i}")).collect()
}

/// Resolve the header list and turn rows into records.
///
/// A detected header row is used verbatim. Otherwise `fallback` is applied
/// positionally to every row, or placeholder names when no fallback is given.
pub fn resolve(table: &Table, fallback: Option<&[String]>) -> Result<ResolvedTable> {
    if table.is_empty() {
        return Err(UpsertError::EmptyInput);
    }

    let header_detected = has_headers(table);
    let (headers, data_rows): (Vec<String>, &[Vec<String>]) = if header_detected {
        (table.rows[0].clone(), &table.rows[1..])
    } else if let Some(schema) = fallback.filter(|s| !s.is_empty()) {
        (schema.to_vec(), &table.rows[..])
    } else {
        (placeholder_headers(table.width()), &table.rows[..])
    };

    debug!(header_detected, columns = headers.len(), rows = data_rows.len(), "resolved headers");

    let records = data_rows.iter().map(|row| zip_row(&headers, row)).collect();
    Ok(ResolvedTable { headers, records, header_detected })
}

/// Pair headers with cells by position. Extra cells and missing trailing
/// cells are both dropped.
pub fn zip_row(headers: &[String], row: &[String]) -> Record {
    headers
        .iter()
        .zip(row.iter())
        .map(|(header, cell)| (header.clone(), Value::String(cell.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_cells() {
        for cell in ["1", " 2.5 ", "-3", "+4", ".5", "5.", "1e3", "0x1F", "Infinity"] {
            assert!(looks_numeric(cell), "{cell} should be numeric");
        }
        for cell in ["", "  ", "abc", "1,000", "nan", "inf", "12a", "--1"] {
            assert!(!looks_numeric(cell), "{cell} should not be numeric");
        }
    }

    #[test]
    fn text_row_is_header() {
        assert!(has_headers(&table(&[&["id", "name"], &["1", "Alice"]])));
    }

    #[test]
    fn numeric_row_is_data() {
        assert!(!has_headers(&table(&[&["1", "2"], &["3", "4"]])));
    }

    #[test]
    fn single_row_never_has_headers() {
        assert!(!has_headers(&table(&[&["id", "name"]])));
    }

    #[test]
    fn tie_counts_as_data() {
        assert!(!has_headers(&table(&[&["1", "Alice"], &["2", "Bob"]])));
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = resolve(&Table::default(), None).expect_err("empty");
        assert!(matches!(err, UpsertError::EmptyInput));
    }

    #[test]
    fn header_row_is_consumed() {
        let resolved = resolve(&table(&[&["sku", "price"], &["A1", "10"]]), None).expect("resolve");
        assert!(resolved.header_detected);
        assert_eq!(resolved.headers, strings(&["sku", "price"]));
        assert_eq!(resolved.records.len(), 1);
        assert_eq!(resolved.records[0]["price"], json!("10"));
    }

    #[test]
    fn fallback_schema_applies_positionally() {
        let schema = strings(&["id", "name"]);
        let resolved =
            resolve(&table(&[&["1", "Alice"], &["2", "Bob"]]), Some(&schema)).expect("resolve");
        assert!(!resolved.header_detected);
        let records: Vec<Value> = resolved.records.into_iter().map(Value::Object).collect();
        assert_eq!(records, vec![json!({"id": "1", "name": "Alice"}), json!({"id": "2", "name": "Bob"})]);
    }

    #[test]
    fn fallback_is_length_tolerant() {
        let schema = strings(&["a", "b", "c"]);
        let resolved = resolve(&table(&[&["1", "2", "3", "4"], &["5"]]), Some(&schema)).expect("resolve");
        assert_eq!(Value::Object(resolved.records[0].clone()), json!({"a": "1", "b": "2", "c": "3"}));
        assert_eq!(Value::Object(resolved.records[1].clone()), json!({"a": "5"}));
    }

    #[test]
    fn placeholders_without_fallback() {
        let resolved = resolve(&table(&[&["1", "2"], &["3", "4"]]), None).expect("resolve");
        assert_eq!(resolved.headers, strings(&["Column1", "Column2"]));
        assert_eq!(resolved.records.len(), 2);
        assert_eq!(resolved.records[1]["Column2"], json!("4"));
    }

    #[test]
    fn detected_header_ignores_fallback() {
        let schema = strings(&["x", "y"]);
        let resolved = resolve(&table(&[&["sku", "name"], &["A1", "Bolt"]]), Some(&schema)).expect("resolve");
        assert_eq!(resolved.headers, strings(&["sku", "name"]));
    }
}
