//! CLI override merging.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::model::Config;
use crate::domain::{FailurePolicy, FieldType};

/// Values supplied on the command line (or through clap's env fallbacks).
/// `None` leaves the file/default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub collection: Option<String>,
    pub key_field: Option<String>,
    pub fallback_schema: Option<Vec<String>>,
    pub schema_preset: Option<String>,
    pub delimiter: Option<char>,
    pub on_store_error: Option<FailurePolicy>,
    pub field_types: BTreeMap<String, FieldType>,
    pub strict_mapping: Option<bool>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(db) = cli.db {
        config.db = db;
    }
    if let Some(collection) = cli.collection {
        config.collection = Some(collection);
    }
    if let Some(key_field) = cli.key_field {
        config.key_field = Some(key_field);
    }
    if let Some(schema) = cli.fallback_schema {
        config.fallback_schema = schema;
    }
    if let Some(preset) = cli.schema_preset {
        config.schema_preset = Some(preset);
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(policy) = cli.on_store_error {
        config.on_store_error = policy;
    }
    config.field_types.extend(cli.field_types);
    if let Some(strict) = cli.strict_mapping {
        config.strict_mapping = strict;
    }
    config
}
