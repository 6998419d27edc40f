//! Delimited text parsing.

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::domain::Table;
use crate::error::Result;

/// Parse delimited text into a headerless table.
///
/// Rows may have differing widths. Rows whose cells are all blank are
/// dropped. Header handling is left to the resolver.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            blank += 1;
            continue;
        }
        rows.push(cells);
    }

    debug!(rows = rows.len(), blank, "parsed delimited text");
    Ok(Table::new(rows))
}
