//! Configuration model.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::{find_preset, FailurePolicy, FieldType, SchemaPreset};
use crate::error::{Result, UpsertError};
use crate::store::sqlite::{StoreConfig, DEFAULT_STORE_PATH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite document store location.
    pub db: PathBuf,
    pub collection: Option<String>,
    pub key_field: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub fallback_schema: Vec<String>,
    pub schema_preset: Option<String>,
    pub delimiter: char,
    pub on_store_error: FailurePolicy,
    pub field_types: BTreeMap<String, FieldType>,
    pub strict_mapping: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db: PathBuf::from(DEFAULT_STORE_PATH),
            collection: None,
            key_field: None,
            fallback_schema: Vec::new(),
            schema_preset: None,
            delimiter: ',',
            on_store_error: FailurePolicy::Abort,
            field_types: BTreeMap::new(),
            strict_mapping: false,
        }
    }
}

impl Config {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig { path: self.db.clone() }
    }

    pub fn preset(&self) -> Result<Option<&'static SchemaPreset>> {
        match self.schema_preset.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => find_preset(name)
                .map(Some)
                .ok_or_else(|| UpsertError::UnknownPreset(name.to_string())),
            None => Ok(None),
        }
    }

    /// Explicit fallback schema, else the preset's fields, else none.
    pub fn fallback(&self) -> Result<Option<Vec<String>>> {
        if !self.fallback_schema.is_empty() {
            return Ok(Some(self.fallback_schema.clone()));
        }
        Ok(self.preset()?.map(SchemaPreset::field_names))
    }

    /// Configured key field, else the preset's, else the first header.
    pub fn key_field_for(&self, headers: &[String]) -> Result<Option<String>> {
        if let Some(key) = self.key_field.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(Some(key.to_string()));
        }
        if let Some(preset) = self.preset()? {
            return Ok(Some(preset.key_field.to_string()));
        }
        Ok(headers.first().cloned())
    }

    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept either `"a, b"` or `["a", "b"]`, trimming and dropping blanks.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(v) => v,
    };
    Ok(raw.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_fallback_beats_preset() {
        let cfg = Config {
            fallback_schema: vec!["id".to_string()],
            schema_preset: Some("vehicle".to_string()),
            ..Config::default()
        };
        assert_eq!(cfg.fallback().expect("fallback"), Some(vec!["id".to_string()]));
        assert_eq!(cfg.key_field_for(&[]).expect("key"), Some("StockCode".to_string()));
    }

    #[test]
    fn key_field_defaults_to_first_header() {
        let cfg = Config::default();
        assert_eq!(
            cfg.key_field_for(&["sku".to_string(), "name".to_string()]).expect("key"),
            Some("sku".to_string())
        );
        assert_eq!(cfg.fallback().expect("fallback"), None);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let cfg = Config { schema_preset: Some("boats".to_string()), ..Config::default() };
        assert!(matches!(cfg.fallback(), Err(UpsertError::UnknownPreset(_))));
    }

    #[test]
    fn delimiter_must_be_ascii() {
        assert_eq!(Config::default().delimiter_byte(), Some(b','));
        let cfg = Config { delimiter: '→', ..Config::default() };
        assert_eq!(cfg.delimiter_byte(), None);
    }
}
