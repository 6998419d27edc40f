//! Collection listing and schema inspection.

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{load_store_settings, open_store, OutputFormat, StoreArgs};
use crate::align::discover;
use crate::config::CliOverrides;
use crate::store::CollectionDiscovery;

#[derive(Args, Debug)]
pub struct CollectionsArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Collection to inspect
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run_collections(args: CollectionsArgs) -> Result<()> {
    let config = load_store_settings(&args.store, CliOverrides::default())?;
    let store = open_store(&config)?;
    let names = store.list().context("Failed to list collections")?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Text if names.is_empty() => eprintln!("No collections found"),
        OutputFormat::Text => names.iter().for_each(|name| println!("{name}")),
    }
    Ok(())
}

pub fn run_schema(args: SchemaArgs) -> Result<()> {
    let config = load_store_settings(&args.store, CliOverrides::default())?;
    let store = open_store(&config)?;
    let fields = discover(&store, &args.collection)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fields)?),
        OutputFormat::Text if fields.is_empty() => {
            eprintln!("Collection '{}' has no documents", args.collection)
        }
        OutputFormat::Text => fields.iter().for_each(|field| println!("{field}")),
    }
    Ok(())
}
