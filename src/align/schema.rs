//! Schema discovery from stored documents.

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::domain::SchemaFieldSet;
use crate::error::{Result, UpsertError};
use crate::store::DocumentStore;

/// Union of top-level field names across every document in `collection`,
/// sorted by codepoint. An empty collection yields an empty set.
pub fn discover(store: &dyn DocumentStore, collection: &str) -> Result<SchemaFieldSet> {
    let documents = store.list_all(collection).map_err(|source| UpsertError::StoreList {
        collection: collection.to_string(),
        source,
    })?;

    if documents.is_empty() {
        info!(collection, "collection is empty, returning empty schema");
        return Ok(BTreeSet::new());
    }

    let fields: SchemaFieldSet =
        documents.iter().flat_map(|(_, doc)| doc.keys().cloned()).collect();
    debug!(collection, documents = documents.len(), fields = fields.len(), "discovered schema");
    Ok(fields)
}
