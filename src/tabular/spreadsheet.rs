//! Spreadsheet conversion collaborator.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use crate::error::{Result, UpsertError};

/// Rows and header names extracted from a workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Converts binary spreadsheet uploads into tabular rows.
pub trait SpreadsheetConverter {
    fn convert(&self, bytes: &[u8]) -> Result<ConvertedSheet>;
}

/// Reads the first worksheet with calamine. The first row becomes the headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineConverter;

impl SpreadsheetConverter for CalamineConverter {
    fn convert(&self, bytes: &[u8]) -> Result<ConvertedSheet> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|err| UpsertError::Conversion(format!("unable to open the spreadsheet: {err}")))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| UpsertError::Conversion("the workbook has no worksheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name).map_err(|err| {
            UpsertError::Conversion(format!("unable to read worksheet '{sheet_name}': {err}"))
        })?;

        let mut rows = range.rows().map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();
        Ok(ConvertedSheet { headers, rows: rows.collect() })
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
