//! Tabular parsing for CSV and spreadsheet uploads.

pub mod csv_reader;
pub mod encoding;
pub mod spreadsheet;
pub mod writer;

use std::path::Path;
use tracing::{debug, info};

use crate::domain::Table;
use crate::error::Result;

pub use csv_reader::parse_delimited;
pub use encoding::decode_upload;
pub use spreadsheet::{CalamineConverter, ConvertedSheet, SpreadsheetConverter};
pub use writer::{apply_headers, value_to_cell, with_headers_file_name, write_csv};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse an uploaded file's bytes into a table.
///
/// Spreadsheets go through `converter`, and its output is re-serialized to
/// CSV and parsed exactly like a native CSV upload.
pub fn parse_upload(
    file_name: &Path,
    bytes: &[u8],
    delimiter: u8,
    converter: &dyn SpreadsheetConverter,
) -> Result<Table> {
    if is_spreadsheet(file_name) {
        let sheet = converter.convert(bytes)?;
        debug!(headers = sheet.headers.len(), rows = sheet.rows.len(), "converted spreadsheet");
        let text = apply_headers(&sheet.rows, &sheet.headers)?;
        return parse_delimited(&text, b',');
    }

    let (text, encoding) = decode_upload(bytes);
    debug!(encoding = %encoding, bytes = bytes.len(), "decoded upload");
    parse_delimited(&text, delimiter)
}

/// Read and parse an upload from disk.
pub fn load_upload(path: &Path, delimiter: u8, converter: &dyn SpreadsheetConverter) -> Result<Table> {
    let bytes = std::fs::read(path)?;
    let table = parse_upload(path, &bytes, delimiter, converter)?;
    info!(path = %path.display(), rows = table.len(), "loaded upload");
    Ok(table)
}
