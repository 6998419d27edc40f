//! Align command implementation.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use super::interactive::edit_mappings;
use super::utils::{
    input_overrides, load_records, load_store_settings, open_store, progress_bar, require_collection,
    InputArgs, OutputFormat, StoreArgs,
};
use crate::align::{build_initial, coerce_records, discover, duplicate_targets, parse_override, project, set_mapping};
use crate::config::{CliOverrides, Config};
use crate::domain::{FieldMapping, Record};
use crate::error::UpsertError;
use crate::reconcile::Reconciler;
use crate::render::{render_mapping_table, render_summary_json, render_summary_text};
use crate::store::SqliteStore;
use crate::tabular::write_csv;

const DEFAULT_ALIGNED_FILE: &str = "aligned-data.csv";

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// CSV or spreadsheet file to align
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Collection whose fields are the mapping targets
    #[arg(short, long, env = "CSV_UPSERT_COLLECTION")]
    pub collection: Option<String>,

    /// Override one mapping: SOURCE=TARGET, or SOURCE= to ignore the column
    #[arg(long = "map", value_name = "SOURCE=TARGET")]
    pub map: Vec<String>,

    /// Pick each column's target field from a menu
    #[arg(short, long)]
    pub interactive: bool,

    /// Write aligned records as CSV (defaults to aligned-data.csv when given without a value)
    #[arg(short, long, value_name = "FILE", num_args = 0..=1, default_missing_value = DEFAULT_ALIGNED_FILE)]
    pub out: Option<PathBuf>,

    /// Upsert the aligned records into the collection
    #[arg(long)]
    pub upsert: bool,

    /// Key field for --upsert (default: first mapped field)
    #[arg(short, long, value_name = "FIELD")]
    pub key_field: Option<String>,

    /// Fail when several columns map to the same target field
    #[arg(long)]
    pub strict_mapping: bool,

    #[command(flatten)]
    pub input: InputArgs,

    /// Summary format on stdout when upserting
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run(args: AlignArgs) -> Result<()> {
    let overrides = CliOverrides {
        collection: args.collection.clone(),
        key_field: args.key_field.clone(),
        strict_mapping: args.strict_mapping.then_some(true),
        ..input_overrides(&args.input)?
    };
    let config = load_store_settings(&args.store, overrides)?;
    let collection = require_collection(&config)?;

    let resolved = load_records(&args.file, &config)?;
    let mut store = open_store(&config)?;

    let schema: Vec<String> = discover(&store, &collection)?.into_iter().collect();
    if schema.is_empty() {
        warn!(%collection, "collection has no documents; columns are ignored unless mapped with --map");
    }

    let mut mappings = build_initial(&resolved.headers, &schema);
    mappings = apply_overrides(mappings, &args.map, &schema)?;
    if args.interactive {
        mappings = edit_mappings(&mappings, &schema)?;
    }

    let collisions = duplicate_targets(&mappings);
    if !collisions.is_empty() {
        if config.strict_mapping {
            return Err(UpsertError::MappingCollision(collisions).into());
        }
        warn!(targets = %collisions.join(", "), "several columns map to the same field; the last column wins");
    }

    eprint!("{}", render_mapping_table(&mappings));

    let mut aligned = project(&resolved.records, &mappings);
    let rejected = coerce_records(&mut aligned, &config.field_types);
    if rejected > 0 {
        eprintln!("{rejected} value(s) could not be converted and were kept as text");
    }
    let columns = target_columns(&mappings);
    info!(records = aligned.len(), columns = columns.len(), "aligned records");

    if let Some(path) = &args.out {
        std::fs::write(path, write_csv(&columns, &aligned)?)?;
        eprintln!("Aligned data written to {}", path.display());
    } else if !args.upsert {
        print!("{}", write_csv(&columns, &aligned)?);
    }

    if args.upsert {
        upsert(&args, &config, &mut store, &aligned, &collection, &columns)?;
    }
    Ok(())
}

fn upsert(
    args: &AlignArgs,
    config: &Config,
    store: &mut SqliteStore,
    records: &[Record],
    collection: &str,
    columns: &[String],
) -> Result<()> {
    let key_field = config
        .key_field_for(columns)?
        .ok_or_else(|| anyhow!("No key field: no column is mapped to a target field"))?;
    if !columns.contains(&key_field) {
        bail!("Key field '{key_field}' is not a mapped target field");
    }

    let report = Reconciler::new(store)
        .policy(config.on_store_error)
        .progress(progress_bar(args.no_progress))
        .reconcile(records, collection, &key_field)?;

    match args.format {
        OutputFormat::Text => print!("{}", render_summary_text(&report)),
        OutputFormat::Json => println!("{}", render_summary_json(&report, collection, true)?),
    }
    if !report.failures.is_empty() {
        bail!("{} record(s) failed to write", report.failures.len());
    }
    Ok(())
}

/// Apply `--map` overrides in order.
fn apply_overrides(
    mut mappings: Vec<FieldMapping>,
    specs: &[String],
    schema: &[String],
) -> Result<Vec<FieldMapping>> {
    for spec in specs {
        let (source, target) =
            parse_override(spec).ok_or_else(|| anyhow!("Invalid --map '{spec}': expected SOURCE=TARGET"))?;
        if let Some(target) = target.as_deref() {
            if !schema.iter().any(|f| f == target) {
                warn!(target_field = target, "mapped target is not an existing field of the collection");
            }
        }
        mappings = set_mapping(&mappings, &source, target.as_deref())?;
    }
    Ok(mappings)
}

/// Active target fields in mapping order, each once.
fn target_columns(mappings: &[FieldMapping]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for target in mappings.iter().filter(|m| m.is_active()).filter_map(|m| m.target_field.as_ref()) {
        if !columns.contains(target) {
            columns.push(target.clone());
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overrides_apply_in_order() {
        let schema = strings(&["name", "sku"]);
        let mappings = build_initial(&strings(&["Name", "Code"]), &schema);
        let mappings = apply_overrides(
            mappings,
            &strings(&["Code=sku", "Name=", "Name=name"]),
            &schema,
        )
        .expect("overrides");
        assert_eq!(target_columns(&mappings), strings(&["name", "sku"]));
    }

    #[test]
    fn bad_override_is_rejected() {
        let mappings = build_initial(&strings(&["Name"]), &strings(&["name"]));
        assert!(apply_overrides(mappings.clone(), &strings(&["Name"]), &[]).is_err());
        assert!(apply_overrides(mappings, &strings(&["Missing=name"]), &[]).is_err());
    }

    #[test]
    fn target_columns_skip_ignored_and_duplicates() {
        let mappings = vec![
            FieldMapping::new("a", Some("x".to_string())),
            FieldMapping::new("b", None),
            FieldMapping::new("c", Some("x".to_string())),
            FieldMapping::new("d", Some("y".to_string())),
        ];
        assert_eq!(target_columns(&mappings), strings(&["x", "y"]));
    }
}
