//! Command-line interface for csv-upsert
//!
//! Provides `upload`, `align`, `headers`, `collections` and `schema` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod align;
mod collections;
mod headers;
mod interactive;
mod upload;
mod utils;

/// Align CSV/XLSX uploads against a collection schema and upsert them into a document store
#[derive(Parser)]
#[command(name = "csv-upsert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert every row of a file into a collection, keyed by one field
    Upload(Box<upload::UploadArgs>),

    /// Map file columns onto a collection's fields, then export and/or upsert
    Align(Box<align::AlignArgs>),

    /// Detect, rename and write header rows for headerless files
    Headers(headers::HeadersArgs),

    /// List collections in the document store
    Collections(collections::CollectionsArgs),

    /// Show the fields discovered in a collection
    Schema(collections::SchemaArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Upload(args) => upload::run(*args),
        Commands::Align(args) => align::run(*args),
        Commands::Headers(args) => headers::run(args),
        Commands::Collections(args) => collections::run_collections(args),
        Commands::Schema(args) => collections::run_schema(args),
    }
}
