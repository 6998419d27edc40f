//! CSV serialization of tables and records.

use csv::WriterBuilder;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::domain::Record;
use crate::error::{Result, UpsertError};

/// Render records as CSV text with a header line.
///
/// When `headers` is empty the columns are the union of record keys in
/// first-seen order. Missing fields become empty cells.
pub fn write_csv(headers: &[String], records: &[Record]) -> Result<String> {
    let columns: Vec<String> = if headers.is_empty() { union_keys(records) } else { headers.to_vec() };

    let mut writer = WriterBuilder::new().flexible(false).from_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for record in records {
        let row: Vec<String> =
            columns.iter().map(|c| record.get(c).map(value_to_cell).unwrap_or_default()).collect();
        writer.write_record(&row)?;
    }
    finish(writer)
}

/// Prepend a header row to raw rows and render as CSV.
pub fn apply_headers(rows: &[Vec<String>], headers: &[String]) -> Result<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    finish(writer)
}

/// String form of a value inside a CSV cell.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// `data.csv` -> `data-with-headers.csv`; no extension -> `.csv`.
pub fn with_headers_file_name(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("csv");
    path.with_file_name(format!("{stem}-with-headers.{ext}"))
}

fn union_keys(records: &[Record]) -> Vec<String> {
    let mut seen = Vec::new();
    for record in records {
        for key in record.keys() {
            if !seen.contains(key) {
                seen.push(key.clone());
            }
        }
    }
    seen
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|err| UpsertError::Io(err.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|err| UpsertError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn writes_union_of_keys_and_escapes() {
        let records = vec![
            record(json!({"sku": "A1", "name": "Bolt, large"})),
            record(json!({"sku": "A2", "tags": ["x", "y"], "price": 2.5})),
        ];
        let csv = write_csv(&[], &records).expect("write");
        assert_eq!(
            csv,
            "sku,name,tags,price\nA1,\"Bolt, large\",,\nA2,,\"[\"\"x\"\",\"\"y\"\"]\",2.5\n"
        );
    }

    #[test]
    fn explicit_headers_fix_column_order() {
        let records = vec![record(json!({"b": 1, "a": null, "c": true}))];
        let csv = write_csv(&["c".to_string(), "a".to_string()], &records).expect("write");
        assert_eq!(csv, "c,a\ntrue,\n");
    }

    #[test]
    fn apply_headers_prepends_row() {
        let rows = vec![vec!["1".to_string(), "Alice".to_string()]];
        let csv = apply_headers(&rows, &["id".to_string(), "name".to_string()]).expect("write");
        assert_eq!(csv, "id,name\n1,Alice\n");
    }

    #[test]
    fn header_file_name_keeps_extension() {
        assert_eq!(with_headers_file_name(Path::new("/tmp/cars.tsv")), PathBuf::from("/tmp/cars-with-headers.tsv"));
        assert_eq!(with_headers_file_name(Path::new("cars")), PathBuf::from("cars-with-headers.csv"));
    }
}
