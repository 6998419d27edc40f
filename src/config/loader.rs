//! Config file loading

use super::model::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SECTION: &str = "csv-upsert";

pub fn load_config(base_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(base_dir),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            // Auto-discovered files never block a run.
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(Config::default())
        }
    }
}

/// Parse TOML config, supporting a nested [csv-upsert] section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested csv-upsert section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(base_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        "csv-upsert.toml",
        ".csv-upsert.toml",
        "csv-upsert.yml",
        ".csv-upsert.yml",
        "csv-upsert.yaml",
        ".csv-upsert.yaml",
    ];

    candidates.iter().map(|c| base_dir.join(c)).find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailurePolicy, FieldType};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("csv-upsert.toml"),
            "collection = 'products'\nkey_field = 'sku'\non_store_error = 'continue'\n\n[field_types]\nprice = 'number'\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.collection.as_deref(), Some("products"));
        assert_eq!(cfg.key_field.as_deref(), Some("sku"));
        assert_eq!(cfg.on_store_error, FailurePolicy::Continue);
        assert_eq!(cfg.field_types.get("price"), Some(&FieldType::Number));
    }

    #[test]
    fn test_nested_section_and_comma_separated_schema() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "[csv-upsert]\nfallback_schema = \"id, name ,, price\"\ndelimiter = ';'\n")
            .expect("write");

        let cfg = load_config(tmp.path(), Some(&path)).expect("config");
        assert_eq!(cfg.fallback_schema, vec!["id", "name", "price"]);
        assert_eq!(cfg.delimiter, ';');
    }

    #[test]
    fn test_load_yaml_config_with_list() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join(".csv-upsert.yml"),
            "schema_preset: vehicle\nfallback_schema:\n  - a\n  - ' b '\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.schema_preset.as_deref(), Some("vehicle"));
        assert_eq!(cfg.fallback_schema, vec!["a", "b"]);
    }

    #[test]
    fn test_explicit_config_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "on_store_error = 'retry'\n").expect("write");

        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_explicit_config_unsupported_extension_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("settings.ini");
        fs::write(&path, "collection = x\n").expect("write");

        let err = load_config(tmp.path(), Some(&path)).expect_err("unsupported");
        assert!(err.to_string().contains("Unsupported config extension"));
    }

    #[test]
    fn test_auto_discovered_invalid_config_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("csv-upsert.toml"), "fallback_schema = 123\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(cfg, Config::default());
    }
}
