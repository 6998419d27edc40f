//! csv-upsert: align CSV/XLSX uploads and upsert them into a document store

use anyhow::Result;

fn main() -> Result<()> {
    csv_upsert::cli::run()
}
