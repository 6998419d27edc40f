//! Error taxonomy for the upload pipeline.

use thiserror::Error;

/// Failures raised by a document-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Stored document {0} is not an object")]
    NotAnObject(String),

    #[error("Unsupported store schema version {found}; expected {expected}")]
    SchemaVersion { found: i64, expected: i64 },

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("CSV file is empty or has no valid data")]
    EmptyInput,

    #[error("Spreadsheet conversion failed: {0}")]
    Conversion(String),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read document '{id}' from '{collection}': {source}")]
    StoreRead {
        collection: String,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to write document '{id}' to '{collection}': {source}")]
    StoreWrite {
        collection: String,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to list documents in '{collection}': {source}")]
    StoreList {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("Several source columns map to the same target field: {}", .0.join(", "))]
    MappingCollision(Vec<String>),

    #[error("Unknown source column: {0}")]
    UnknownSourceField(String),

    #[error("Unknown schema preset: {0}")]
    UnknownPreset(String),
}

pub type Result<T> = std::result::Result<T, UpsertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_name_the_document() {
        let err = UpsertError::StoreWrite {
            collection: "products".to_string(),
            id: "A1".to_string(),
            source: StoreError::Backend("disk full".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("'A1'"));
        assert!(msg.contains("'products'"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn collision_lists_targets() {
        let err = UpsertError::MappingCollision(vec!["name".to_string(), "sku".to_string()]);
        assert_eq!(
            err.to_string(),
            "Several source columns map to the same target field: name, sku"
        );
    }
}
