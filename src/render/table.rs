//! Fixed-width text tables.

use unicode_width::UnicodeWidthStr;

use crate::domain::FieldMapping;

const IGNORE_LABEL: &str = "(ignore)";

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn render_rows(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).chain(std::iter::once(header.len())).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let line = |row: &[String]| {
        let cells: Vec<String> = (0..columns)
            .map(|i| pad(row.get(i).map(String::as_str).unwrap_or(""), widths[i]))
            .collect();
        format!("{}\n", cells.join(" | ").trim_end())
    };

    let mut out = line(header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

/// Two-column view of source column to target field.
pub fn render_mapping_table(mappings: &[FieldMapping]) -> String {
    let header = vec!["Source column".to_string(), "Target field".to_string()];
    let rows: Vec<Vec<String>> = mappings
        .iter()
        .map(|m| {
            let target =
                m.target_field.as_deref().filter(|t| !t.is_empty()).unwrap_or(IGNORE_LABEL);
            vec![m.source_field.clone(), target.to_string()]
        })
        .collect();
    render_rows(&header, &rows)
}

/// Headers plus the first `limit` rows, with a trailer when rows were cut.
pub fn render_preview(headers: &[String], rows: &[Vec<String>], limit: usize) -> String {
    let shown: Vec<Vec<String>> = rows.iter().take(limit).cloned().collect();
    let mut out = render_rows(headers, &shown);
    if rows.len() > limit {
        out.push_str(&format!("Showing first {} rows of {} total rows\n", limit, rows.len()));
    }
    out
}
