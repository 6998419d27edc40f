//! Headers command implementation.

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{load_settings, parse_csv};
use crate::align::{has_headers, placeholder_headers};
use crate::config::CliOverrides;
use crate::render::render_preview;
use crate::tabular::{apply_headers, is_spreadsheet, load_upload, with_headers_file_name, CalamineConverter};

#[derive(Args, Debug)]
pub struct HeadersArgs {
    /// CSV or spreadsheet file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Rename a column: INDEX=NAME, 1-based
    #[arg(long = "set", value_name = "INDEX=NAME")]
    pub set: Vec<String>,

    /// Headers to use when none are detected (comma-separated)
    #[arg(long, value_name = "FIELDS")]
    pub fallback_schema: Option<String>,

    /// Built-in header preset for files without a header row
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Output file (default: <name>-with-headers.<ext>)
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Number of rows to preview
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Only show the preview, do not write a file
    #[arg(long)]
    pub dry_run: bool,

    /// Field delimiter for CSV input
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Path to config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: HeadersArgs) -> Result<()> {
    let overrides = CliOverrides {
        fallback_schema: parse_csv(&args.fallback_schema),
        schema_preset: args.preset.clone(),
        delimiter: args.delimiter,
        ..CliOverrides::default()
    };
    let config = load_settings(args.config.as_deref(), overrides)?;
    let delimiter = config
        .delimiter_byte()
        .ok_or_else(|| anyhow!("Delimiter must be a single ASCII character, got {:?}", config.delimiter))?;

    let table = load_upload(&args.file, delimiter, &CalamineConverter)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    if table.is_empty() {
        bail!("{} has no rows", args.file.display());
    }

    let detected = has_headers(&table);
    let (mut headers, rows) = if detected {
        (table.rows[0].clone(), &table.rows[1..])
    } else {
        (initial_headers(table.width(), config.fallback()?), &table.rows[..])
    };

    if detected {
        println!("Headers detected: {}", headers.join(", "));
    } else {
        println!("No headers detected; proposed headers: {}", headers.join(", "));
    }

    for spec in &args.set {
        rename(&mut headers, spec)?;
    }

    println!();
    print!("{}", render_preview(&headers, rows, args.preview));

    if args.dry_run {
        return Ok(());
    }

    let out = args.out.clone().unwrap_or_else(|| {
        let mut path = with_headers_file_name(&args.file);
        if is_spreadsheet(&args.file) {
            path.set_extension("csv");
        }
        path
    });
    std::fs::write(&out, apply_headers(rows, &headers)?)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    eprintln!("Wrote {} rows to {}", rows.len(), out.display());
    Ok(())
}

/// Fallback names for as many columns as they cover, placeholders for the rest.
fn initial_headers(width: usize, fallback: Option<Vec<String>>) -> Vec<String> {
    let mut headers = placeholder_headers(width);
    for (slot, name) in headers.iter_mut().zip(fallback.unwrap_or_default()) {
        *slot = name;
    }
    headers
}

/// Apply one `INDEX=NAME` rename, 1-based.
fn rename(headers: &mut [String], spec: &str) -> Result<()> {
    let (index, name) =
        spec.split_once('=').ok_or_else(|| anyhow!("Invalid --set '{spec}': expected INDEX=NAME"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid --set '{spec}': column index must be a number"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid --set '{spec}': header name is empty");
    }
    let len = headers.len();
    let slot = index
        .checked_sub(1)
        .and_then(|i| headers.get_mut(i))
        .ok_or_else(|| anyhow!("Column {index} is out of range (1-{len})"))?;
    *slot = name.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fallback_fills_leading_columns() {
        assert_eq!(
            initial_headers(3, Some(strings(&["id", "name"]))),
            strings(&["id", "name", "Column3"])
        );
        assert_eq!(initial_headers(2, None), strings(&["Column1", "Column2"]));
        assert_eq!(initial_headers(1, Some(strings(&["id", "name"]))), strings(&["id"]));
    }

    #[test]
    fn rename_is_one_based() {
        let mut headers = strings(&["Column1", "Column2"]);
        rename(&mut headers, "2=price").expect("rename");
        assert_eq!(headers, strings(&["Column1", "price"]));
    }

    #[test]
    fn rename_rejects_bad_specs() {
        let mut headers = strings(&["Column1"]);
        assert!(rename(&mut headers, "0=x").is_err());
        assert!(rename(&mut headers, "2=x").is_err());
        assert!(rename(&mut headers, "one=x").is_err());
        assert!(rename(&mut headers, "1=").is_err());
        assert!(rename(&mut headers, "1").is_err());
    }
}
