//! Shared CLI utilities.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, ValueEnum};
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::align::resolve;
use crate::config::{load_config, merge_cli_with_config, CliOverrides, Config};
use crate::domain::{FieldType, ResolvedTable};
use crate::store::SqliteStore;
use crate::tabular::{load_upload, CalamineConverter};

/// Store and config location flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite document store path
    #[arg(long, value_name = "FILE", env = "CSV_UPSERT_DB")]
    pub db: Option<PathBuf>,

    /// Path to config file (csv-upsert.toml or .csv-upsert.yml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Flags controlling how an uploaded file becomes records.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Fallback schema applied positionally when the file has no header row (comma-separated)
    #[arg(long, value_name = "FIELDS")]
    pub fallback_schema: Option<String>,

    /// Built-in fallback schema preset (e.g. "vehicle")
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Field delimiter for CSV input
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Coerce a field to a type after parsing: FIELD=string|number|boolean|array|object|date
    #[arg(long = "type", value_name = "FIELD=TYPE")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Parse repeated `FIELD=TYPE` flags.
pub fn parse_field_types(specs: &[String]) -> Result<BTreeMap<String, FieldType>> {
    let mut types = BTreeMap::new();
    for spec in specs {
        let (field, ty) =
            spec.split_once('=').ok_or_else(|| anyhow!("Invalid --type '{spec}': expected FIELD=TYPE"))?;
        let field = field.trim();
        if field.is_empty() {
            bail!("Invalid --type '{spec}': field name is empty");
        }
        let ty: FieldType = ty.parse().map_err(|e: String| anyhow!(e))?;
        types.insert(field.to_string(), ty);
    }
    Ok(types)
}

/// Load the config file relative to the working directory and apply CLI overrides.
pub fn load_settings(config_path: Option<&Path>, overrides: CliOverrides) -> Result<Config> {
    let cwd = std::env::current_dir()?;
    let file_config = load_config(&cwd, config_path)?;
    Ok(merge_cli_with_config(file_config, overrides))
}

/// Config for commands that touch the document store.
pub fn load_store_settings(store: &StoreArgs, overrides: CliOverrides) -> Result<Config> {
    let overrides = CliOverrides { db: store.db.clone().or(overrides.db), ..overrides };
    load_settings(store.config.as_deref(), overrides)
}

pub fn input_overrides(input: &InputArgs) -> Result<CliOverrides> {
    Ok(CliOverrides {
        fallback_schema: parse_csv(&input.fallback_schema),
        schema_preset: input.preset.clone(),
        delimiter: input.delimiter,
        field_types: parse_field_types(&input.types)?,
        ..CliOverrides::default()
    })
}

pub fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.store_config())
        .with_context(|| format!("Failed to open document store at {}", config.db.display()))
}

pub fn require_collection(config: &Config) -> Result<String> {
    config
        .collection
        .clone()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow!("A collection is required (--collection or `collection` in config)"))
}

/// Parse the upload and resolve its header row.
pub fn load_records(path: &Path, config: &Config) -> Result<ResolvedTable> {
    let delimiter = config
        .delimiter_byte()
        .ok_or_else(|| anyhow!("Delimiter must be a single ASCII character, got {:?}", config.delimiter))?;
    let table = load_upload(path, delimiter, &CalamineConverter)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let fallback = config.fallback()?;
    let resolved = resolve(&table, fallback.as_deref())?;

    if resolved.header_detected {
        eprintln!("Headers detected: {}", resolved.headers.join(", "));
    } else if fallback.is_some() {
        eprintln!("No headers detected; applied fallback schema: {}", resolved.headers.join(", "));
    } else {
        eprintln!("No headers detected; using placeholder headers: {}", resolved.headers.join(", "));
    }
    Ok(resolved)
}

/// Progress bar on stderr, hidden when stderr is not a terminal.
pub fn progress_bar(disabled: bool) -> ProgressBar {
    if disabled || !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} records") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_trims_and_drops_blanks() {
        assert_eq!(
            parse_csv(&Some(" id, name ,,price ".to_string())),
            Some(vec!["id".to_string(), "name".to_string(), "price".to_string()])
        );
        assert_eq!(parse_csv(&None), None);
    }

    #[test]
    fn parse_field_types_accepts_pairs() {
        let types = parse_field_types(&["price=number".to_string(), "active = bool".to_string()])
            .expect("types");
        assert_eq!(types["price"], FieldType::Number);
        assert_eq!(types["active"], FieldType::Boolean);
    }

    #[test]
    fn parse_field_types_rejects_garbage() {
        assert!(parse_field_types(&["price".to_string()]).is_err());
        assert!(parse_field_types(&["price=money".to_string()]).is_err());
        assert!(parse_field_types(&["=number".to_string()]).is_err());
    }
}
