//! Core data types shared across parsing, alignment and reconciliation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One record: field name to typed value, in insertion order.
pub type Record = Map<String, Value>;

/// Raw parsed rows, each an ordered list of cell strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Width of the first row, used for placeholder headers.
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// Output of header resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    /// Whether row 0 was consumed as the header row.
    pub header_detected: bool,
}

/// Maps one source column onto a target field. `None` means the column is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source_field: String,
    pub target_field: Option<String>,
}

impl FieldMapping {
    pub fn new(source_field: impl Into<String>, target_field: Option<String>) -> Self {
        Self { source_field: source_field.into(), target_field }
    }

    pub fn is_active(&self) -> bool {
        self.target_field.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Alphabetically sorted field names discovered from a collection.
pub type SchemaFieldSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Added,
    Updated,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStatus::Added => "added",
            SummaryStatus::Updated => "updated",
        }
    }
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one record that mutated the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub id: String,
    pub status: SummaryStatus,
    pub key_field: String,
    pub key_value: Value,
    pub fields: Vec<String>,
}

/// A record the reconciler could not write under the `continue` policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    /// Zero-based position in the input batch.
    pub row: usize,
    pub key_value: Value,
    pub message: String,
}

/// Result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub items: Vec<SummaryItem>,
    pub processed: usize,
    pub skipped_missing_key: usize,
    pub unchanged: usize,
    pub failures: Vec<RecordFailure>,
}

impl ReconcileReport {
    pub fn added(&self) -> usize {
        self.items.iter().filter(|i| i.status == SummaryStatus::Added).count()
    }

    pub fn updated(&self) -> usize {
        self.items.iter().filter(|i| i.status == SummaryStatus::Updated).count()
    }

    pub fn headline(&self) -> String {
        format!(
            "Processed {} documents: {} added, {} updated",
            self.items.len(),
            self.added(),
            self.updated()
        )
    }
}

/// What to do when the store fails for a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!("Invalid store error policy: {other} (expected abort or continue)")),
        }
    }
}

/// Target type for optional value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "array" => Ok(FieldType::Array),
            "object" => Ok(FieldType::Object),
            "date" => Ok(FieldType::Date),
            other => Err(format!("Unknown field type: {other}")),
        }
    }
}

/// A named fallback schema with its preferred key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaPreset {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub key_field: &'static str,
}

impl SchemaPreset {
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.to_string()).collect()
    }
}

pub const VEHICLE_PRESET: SchemaPreset = SchemaPreset {
    name: "vehicle",
    fields: &[
        "StockCode",
        "Description",
        "LongDesc",
        "Customer",
        "RegNo",
        "WarrantyStartDate",
        "WarrantyBookNo",
        "EngineNo",
        "KM",
        "WarrantyEndDate",
        "VehicleProdClass",
        "ProductClass",
    ],
    key_field: "StockCode",
};

pub const SCHEMA_PRESETS: &[SchemaPreset] = &[VEHICLE_PRESET];

pub fn find_preset(name: &str) -> Option<&'static SchemaPreset> {
    SCHEMA_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}
