//! In-process document store.

use std::collections::BTreeMap;

use super::{merge_fields, CollectionDiscovery, DocumentStore, StoreResult};
use crate::domain::Record;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, BTreeMap<String, Record>>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls seen so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(BTreeMap::len).unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        Ok(self.collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    fn set(&mut self, collection: &str, id: &str, fields: &Record, merge: bool) -> StoreResult<()> {
        self.writes += 1;
        let docs = self.collections.entry(collection.to_string()).or_default();
        match docs.get_mut(id) {
            Some(existing) if merge => merge_fields(existing, fields),
            _ => {
                docs.insert(id.to_string(), fields.clone());
            }
        }
        Ok(())
    }

    fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Record)>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect())
            .unwrap_or_default())
    }
}

impl CollectionDiscovery for MemoryStore {
    fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }
}
