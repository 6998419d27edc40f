//! Source column to target field mapping.

use std::collections::BTreeMap;

use crate::domain::FieldMapping;
use crate::error::{Result, UpsertError};

/// Propose one mapping per source header.
///
/// Each header takes the first exact match in `schema_fields`, falling back to
/// the first case-insensitive match, or is ignored.
pub fn build_initial<S: AsRef<str>>(source_headers: &[String], schema_fields: &[S]) -> Vec<FieldMapping> {
    source_headers
        .iter()
        .map(|source| {
            let exact = schema_fields.iter().map(AsRef::as_ref).find(|field| *field == source.as_str());
            let target = exact.or_else(|| {
                let lowered = source.to_lowercase();
                schema_fields.iter().map(AsRef::as_ref).find(|field| field.to_lowercase() == lowered)
            });
            FieldMapping::new(source.clone(), target.map(str::to_string))
        })
        .collect()
}

/// Return a copy of `mappings` with `source_field` pointed at `target_field`.
///
/// Only the first mapping for that source changes. An empty target means ignore.
pub fn set_mapping(
    mappings: &[FieldMapping],
    source_field: &str,
    target_field: Option<&str>,
) -> Result<Vec<FieldMapping>> {
    let index = mappings
        .iter()
        .position(|m| m.source_field == source_field)
        .ok_or_else(|| UpsertError::UnknownSourceField(source_field.to_string()))?;

    let mut updated = mappings.to_vec();
    updated[index].target_field = target_field.filter(|t| !t.is_empty()).map(str::to_string);
    Ok(updated)
}

/// Target fields claimed by more than one active mapping, sorted.
pub fn duplicate_targets(mappings: &[FieldMapping]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for mapping in mappings.iter().filter(|m| m.is_active()) {
        if let Some(target) = mapping.target_field.as_deref() {
            *counts.entry(target).or_default() += 1;
        }
    }
    counts.into_iter().filter(|(_, n)| *n > 1).map(|(t, _)| t.to_string()).collect()
}

/// Parse a `SOURCE=TARGET` override. `SOURCE=` ignores the column.
pub fn parse_override(spec: &str) -> Option<(String, Option<String>)> {
    let (source, target) = spec.split_once('=')?;
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    let target = target.trim();
    Some((source.to_string(), (!target.is_empty()).then(|| target.to_string())))
}
