//! Projection of records through a finalized mapping.

use crate::domain::{FieldMapping, Record};

/// Rename fields per `mappings`, dropping ignored columns.
///
/// When several mappings share a target, the later mapping wins. Source
/// fields missing from a record are left out of its projection.
pub fn project(records: &[Record], mappings: &[FieldMapping]) -> Vec<Record> {
    records.iter().map(|record| project_one(record, mappings)).collect()
}

fn project_one(record: &Record, mappings: &[FieldMapping]) -> Record {
    let mut out = Record::new();
    for mapping in mappings {
        let Some(target) = mapping.target_field.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if let Some(value) = record.get(&mapping.source_field) {
            out.insert(target.to_string(), value.clone());
        }
    }
    out
}
