//! Document-store collaborators.
//!
//! The reconciler only needs three operations: fetch one document, write one
//! document (replace or merge), and list a collection. Collection enumeration
//! is a separate capability so stores without it can still be used for upserts.

pub mod memory;
pub mod sqlite;

use crate::domain::Record;
use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait DocumentStore {
    /// Fetch a document, or `None` when it does not exist.
    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Write a document. With `merge`, top-level fields are overlaid onto the
    /// existing document; without it, the document is replaced.
    fn set(&mut self, collection: &str, id: &str, fields: &Record, merge: bool) -> StoreResult<()>;

    /// Every document in a collection as `(id, fields)`, ordered by id.
    fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Record)>>;
}

pub trait CollectionDiscovery {
    /// Names of all collections holding at least one document, sorted.
    fn list(&self) -> StoreResult<Vec<String>>;
}

/// Overlay `fields` onto `existing`, keeping fields not present in `fields`.
pub(crate) fn merge_fields(existing: &mut Record, fields: &Record) {
    for (key, value) in fields {
        existing.insert(key.clone(), value.clone());
    }
}
