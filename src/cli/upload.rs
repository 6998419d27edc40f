//! Upload command implementation.

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::utils::{
    input_overrides, load_records, load_store_settings, open_store, progress_bar, require_collection,
    InputArgs, OutputFormat, StoreArgs,
};
use crate::align::coerce_records;
use crate::config::CliOverrides;
use crate::domain::FailurePolicy;
use crate::reconcile::Reconciler;
use crate::render::{render_summary_json, render_summary_text, write_summary};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// CSV or spreadsheet file to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Target collection
    #[arg(short, long, env = "CSV_UPSERT_COLLECTION")]
    pub collection: Option<String>,

    /// Field whose value identifies each document (default: first header)
    #[arg(short, long, value_name = "FIELD")]
    pub key_field: Option<String>,

    #[command(flatten)]
    pub input: InputArgs,

    /// What to do when a single write fails: abort or continue
    #[arg(long, value_name = "POLICY")]
    pub on_store_error: Option<String>,

    /// Summary format on stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Also write the JSON summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary_out: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run(args: UploadArgs) -> Result<()> {
    let on_store_error = args
        .on_store_error
        .as_deref()
        .map(str::parse::<FailurePolicy>)
        .transpose()
        .map_err(|e| anyhow!(e))?;

    let overrides = CliOverrides {
        collection: args.collection.clone(),
        key_field: args.key_field.clone(),
        on_store_error,
        ..input_overrides(&args.input)?
    };
    let config = load_store_settings(&args.store, overrides)?;
    let collection = require_collection(&config)?;

    let mut resolved = load_records(&args.file, &config)?;
    let key_field = config
        .key_field_for(&resolved.headers)?
        .ok_or_else(|| anyhow!("No key field: the file has no columns"))?;
    info!(file = %args.file.display(), records = resolved.records.len(), %key_field, "parsed upload");

    let rejected = coerce_records(&mut resolved.records, &config.field_types);
    if rejected > 0 {
        eprintln!("{rejected} value(s) could not be converted and were kept as text");
    }

    let mut store = open_store(&config)?;
    let report = Reconciler::new(&mut store)
        .policy(config.on_store_error)
        .progress(progress_bar(args.no_progress))
        .reconcile(&resolved.records, &collection, &key_field)?;

    match args.format {
        OutputFormat::Text => print!("{}", render_summary_text(&report)),
        OutputFormat::Json => println!("{}", render_summary_json(&report, &collection, true)?),
    }

    if let Some(path) = &args.summary_out {
        write_summary(path, &report, &collection)?;
        eprintln!("Summary written to {}", path.display());
    }

    if !report.failures.is_empty() {
        return Err(anyhow!("{} record(s) failed to write", report.failures.len()));
    }
    Ok(())
}
