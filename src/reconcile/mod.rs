//! Idempotent upsert of records into a document store.
//!
//! Records are processed strictly in order: a later record with the same key
//! sees the write made for an earlier one. Records without a usable key
//! value are skipped without error, and records identical to the stored
//! document cause no write and no summary entry.

pub mod diff;
pub mod doc_id;

use indicatif::ProgressBar;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::domain::{FailurePolicy, Record, ReconcileReport, RecordFailure, SummaryItem, SummaryStatus};
use crate::error::{Result, UpsertError};
use crate::store::DocumentStore;

pub use diff::{changed_fields, values_equal};
pub use doc_id::{doc_id_for, is_falsy, sanitize_doc_id};

pub struct Reconciler<'a> {
    store: &'a mut dyn DocumentStore,
    policy: FailurePolicy,
    progress: Option<ProgressBar>,
}

enum Outcome {
    Changed(SummaryItem),
    Unchanged,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut dyn DocumentStore) -> Self {
        Self { store, policy: FailurePolicy::default(), progress: None }
    }

    /// Set what happens when the store fails for one record.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Tick `bar` once per input record.
    pub fn progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn reconcile(
        &mut self,
        records: &[Record],
        collection: &str,
        key_field: &str,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        if let Some(bar) = &self.progress {
            bar.set_length(records.len() as u64);
        }

        for (row, record) in records.iter().enumerate() {
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }

            let key_value = match record.get(key_field) {
                Some(value) if !is_falsy(value) => value,
                _ => {
                    warn!(row, key_field, "skipping record with no key value");
                    report.skipped_missing_key += 1;
                    continue;
                }
            };
            report.processed += 1;

            match self.upsert_one(record, collection, key_field, key_value) {
                Ok(Outcome::Changed(item)) => report.items.push(item),
                Ok(Outcome::Unchanged) => report.unchanged += 1,
                Err(err) if self.policy == FailurePolicy::Continue => {
                    error!(row, error = %err, "record failed, continuing");
                    report.failures.push(RecordFailure {
                        row,
                        key_value: key_value.clone(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    if let Some(bar) = &self.progress {
                        bar.abandon();
                    }
                    return Err(err);
                }
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        info!(
            collection,
            added = report.added(),
            updated = report.updated(),
            unchanged = report.unchanged,
            skipped = report.skipped_missing_key,
            failed = report.failures.len(),
            "reconciliation finished"
        );
        Ok(report)
    }

    fn upsert_one(
        &mut self,
        record: &Record,
        collection: &str,
        key_field: &str,
        key_value: &Value,
    ) -> Result<Outcome> {
        let id = doc_id_for(key_value);
        let existing = self.store.get_by_id(collection, &id).map_err(|source| {
            UpsertError::StoreRead { collection: collection.to_string(), id: id.clone(), source }
        })?;

        let (status, fields, merge) = match existing {
            None => (SummaryStatus::Added, record.keys().cloned().collect(), false),
            Some(existing) => {
                let changed = changed_fields(&existing, record);
                if changed.is_empty() {
                    debug!(id = %id, "unchanged");
                    return Ok(Outcome::Unchanged);
                }
                (SummaryStatus::Updated, changed, true)
            }
        };

        self.store.set(collection, &id, record, merge).map_err(|source| UpsertError::StoreWrite {
            collection: collection.to_string(),
            id: id.clone(),
            source,
        })?;
        debug!(id = %id, status = %status, fields = ?fields, "upserted");

        Ok(Outcome::Changed(SummaryItem {
            id,
            status,
            key_field: key_field.to_string(),
            key_value: key_value.clone(),
            fields,
        }))
    }
}

/// Reconcile with the default (abort) policy and return only the summary items.
pub fn reconcile(
    store: &mut dyn DocumentStore,
    records: &[Record],
    collection: &str,
    key_field: &str,
) -> Result<Vec<SummaryItem>> {
    Ok(Reconciler::new(store).reconcile(records, collection, key_field)?.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{MemoryStore, StoreResult};
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Fails writes for `poisoned`, and reads too when `fail_reads` is set.
    struct FlakyStore {
        inner: MemoryStore,
        poisoned: String,
        fail_reads: bool,
    }

    impl FlakyStore {
        fn failing_writes(id: &str) -> Self {
            Self { inner: MemoryStore::new(), poisoned: id.to_string(), fail_reads: false }
        }

        fn failing_reads(id: &str) -> Self {
            Self { fail_reads: true, ..Self::failing_writes(id) }
        }
    }

    impl DocumentStore for FlakyStore {
        fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
            if self.fail_reads && id == self.poisoned {
                return Err(StoreError::Backend("read timed out".to_string()));
            }
            self.inner.get_by_id(collection, id)
        }

        fn set(&mut self, collection: &str, id: &str, fields: &Record, merge: bool) -> StoreResult<()> {
            if id == self.poisoned {
                return Err(StoreError::Backend("write rejected".to_string()));
            }
            self.inner.set(collection, id, fields, merge)
        }

        fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Record)>> {
            self.inner.list_all(collection)
        }
    }

    #[test]
    fn new_record_is_added_with_all_fields() {
        let mut store = MemoryStore::new();
        let items = reconcile(&mut store, &[record(json!({"sku": "A1", "price": 10}))], "products", "sku")
            .expect("reconcile");
        assert_eq!(
            items,
            vec![SummaryItem {
                id: "A1".to_string(),
                status: SummaryStatus::Added,
                key_field: "sku".to_string(),
                key_value: json!("A1"),
                fields: strings(&["sku", "price"]),
            }]
        );
    }

    #[test]
    fn changed_record_is_updated_with_changed_fields() {
        let mut store = MemoryStore::new();
        store.set("products", "A1", &record(json!({"sku": "A1", "price": 5})), false).expect("seed");
        let items = reconcile(&mut store, &[record(json!({"sku": "A1", "price": 10}))], "products", "sku")
            .expect("reconcile");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, SummaryStatus::Updated);
        assert_eq!(items[0].fields, strings(&["price"]));
    }

    #[test]
    fn update_merges_and_never_deletes() {
        let mut store = MemoryStore::new();
        store
            .set("products", "A1", &record(json!({"sku": "A1", "price": 5, "stock": 3})), false)
            .expect("seed");
        reconcile(&mut store, &[record(json!({"sku": "A1", "price": 10}))], "products", "sku").expect("reconcile");
        let stored = store.get_by_id("products", "A1").expect("get").expect("exists");
        assert_eq!(Value::Object(stored), json!({"sku": "A1", "price": 10, "stock": 3}));
    }

    #[test]
    fn second_identical_run_reports_nothing() {
        let mut store = MemoryStore::new();
        let records = vec![
            record(json!({"sku": "A1", "price": "10"})),
            record(json!({"sku": "B2", "price": "7", "tags": ["x"]})),
        ];
        let first = reconcile(&mut store, &records, "products", "sku").expect("first run");
        assert_eq!(first.len(), 2);
        let writes = store.writes();

        let second = reconcile(&mut store, &records, "products", "sku").expect("second run");
        assert!(second.is_empty());
        assert_eq!(store.writes(), writes);
    }

    #[test]
    fn missing_or_empty_key_is_skipped_without_writes() {
        let mut store = MemoryStore::new();
        let records = vec![
            record(json!({"name": "no key"})),
            record(json!({"sku": "", "name": "empty key"})),
            record(json!({"sku": null})),
        ];
        let report = Reconciler::new(&mut store).reconcile(&records, "products", "sku").expect("reconcile");
        assert!(report.items.is_empty());
        assert_eq!(report.skipped_missing_key, 3);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn summary_id_is_sanitized_key() {
        let mut store = MemoryStore::new();
        let items = reconcile(&mut store, &[record(json!({"code": "A/B#1"}))], "parts", "code").expect("reconcile");
        assert_eq!(items[0].id, "A_B_1");
        assert_eq!(items[0].key_value, json!("A/B#1"));
        assert!(store.get_by_id("parts", "A_B_1").expect("get").is_some());
    }

    #[test]
    fn duplicate_keys_in_batch_see_earlier_writes() {
        let mut store = MemoryStore::new();
        let records = vec![
            record(json!({"sku": "A1", "price": "1"})),
            record(json!({"sku": "A1", "price": "2"})),
            record(json!({"sku": "A1", "price": "2"})),
        ];
        let report = Reconciler::new(&mut store).reconcile(&records, "products", "sku").expect("reconcile");
        let statuses: Vec<SummaryStatus> = report.items.iter().map(|i| i.status).collect();
        assert_eq!(statuses, vec![SummaryStatus::Added, SummaryStatus::Updated]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(store.document_count("products"), 1);
    }

    #[test]
    fn abort_policy_stops_the_batch() {
        let mut store = FlakyStore::failing_writes("B");
        let records =
            vec![record(json!({"k": "A"})), record(json!({"k": "B"})), record(json!({"k": "C"}))];
        let err = Reconciler::new(&mut store).reconcile(&records, "c", "k").expect_err("must abort");
        assert!(matches!(err, UpsertError::StoreWrite { ref id, .. } if id == "B"));
        assert!(store.inner.get_by_id("c", "A").expect("get").is_some());
        assert!(store.inner.get_by_id("c", "C").expect("get").is_none());
    }

    #[test]
    fn continue_policy_records_failures() {
        let mut store = FlakyStore::failing_writes("B");
        let records =
            vec![record(json!({"k": "A"})), record(json!({"k": "B"})), record(json!({"k": "C"}))];
        let report = Reconciler::new(&mut store)
            .policy(FailurePolicy::Continue)
            .reconcile(&records, "c", "k")
            .expect("continue");
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 1);
        assert_eq!(report.failures[0].key_value, json!("B"));
    }

    #[test]
    fn read_failure_aborts_by_default() {
        let mut store = FlakyStore::failing_reads("B");
        let records =
            vec![record(json!({"k": "A"})), record(json!({"k": "B"})), record(json!({"k": "C"}))];
        let err = Reconciler::new(&mut store).reconcile(&records, "c", "k").expect_err("must abort");
        match err {
            UpsertError::StoreRead { collection, id, source } => {
                assert_eq!(collection.as_str(), "c");
                assert_eq!(id.as_str(), "B");
                assert!(source.to_string().contains("read timed out"));
            }
            other => panic!("expected a read error, got {other:?}"),
        }
        assert_eq!(store.inner.document_count("c"), 1);
        assert_eq!(store.inner.writes(), 1);
    }

    #[test]
    fn read_failure_is_recorded_under_continue() {
        let mut store = FlakyStore::failing_reads("B");
        let records =
            vec![record(json!({"k": "A"})), record(json!({"k": "B"})), record(json!({"k": "C"}))];
        let report = Reconciler::new(&mut store)
            .policy(FailurePolicy::Continue)
            .reconcile(&records, "c", "k")
            .expect("continue");
        let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 1);
        assert_eq!(report.failures[0].key_value, json!("B"));
        assert!(report.failures[0].message.starts_with("Failed to read document 'B' from 'c'"));
        assert_eq!(store.inner.document_count("c"), 2);
    }
}
