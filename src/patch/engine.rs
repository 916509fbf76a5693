//! Store-backed patch engine.

use crate::error::{DataRepoError, Result, StoreError};
use crate::store::{DocumentStore, Filter};
use crate::types::{Document, PatchItem};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Complete document state around one successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Document before the mutation (`Null` if it could not be read).
    pub before: Value,
    /// Document after the mutation (`Null` if it could not be read).
    pub after: Value,
}

/// Applies patches and merges through a [`DocumentStore`] and captures the
/// full document on either side of the mutation.
///
/// The read-mutate-read sequence is three independent store calls; the
/// mutation itself is the only atomic step.
pub struct PatchEngine {
    store: Arc<dyn DocumentStore>,
}

impl PatchEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Apply ordered operations to the matching document, or to one of its
    /// top-level sub-fields when `subfield` is given.
    pub fn patch(
        &self,
        collection: &str,
        filter: &Filter,
        items: &[PatchItem],
        subfield: Option<&str>,
    ) -> Result<Snapshot> {
        let before = self.read(collection, filter);

        let applied = match subfield {
            Some(field) => self
                .store
                .json_patch_extend(collection, filter, items, field),
            None => self.store.json_patch(collection, filter, items),
        };
        applied.map_err(|e| rejected(collection, e))?;

        let after = self.read(collection, filter);
        Ok(Snapshot { before, after })
    }

    /// Merge a partial document into the matching document.
    pub fn merge(&self, collection: &str, filter: &Filter, partial: &Document) -> Result<Snapshot> {
        let before = self.read(collection, filter);

        self.store
            .merge_patch(collection, filter, partial)
            .map_err(|e| rejected(collection, e))?;

        let after = self.read(collection, filter);
        Ok(Snapshot { before, after })
    }

    fn read(&self, collection: &str, filter: &Filter) -> Value {
        match self.store.get_one(collection, filter) {
            Ok(Some(doc)) => Value::Object(doc),
            Ok(None) => Value::Null,
            Err(e) => {
                warn!(collection, error = %e, "snapshot read failed");
                Value::Null
            }
        }
    }
}

fn rejected(collection: &str, e: StoreError) -> DataRepoError {
    debug!(collection, error = %e, "store rejected update");
    DataRepoError::ModifyNotAllowed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seeded() -> (Arc<MemoryStore>, PatchEngine) {
        let store = Arc::new(MemoryStore::new());
        let doc = json!({"ueId": "imsi-1", "a": 1, "list": [1, 2]});
        store
            .put_one(
                "c",
                &Filter::by("ueId", "imsi-1"),
                doc.as_object().cloned().unwrap(),
            )
            .unwrap();
        let engine = PatchEngine::new(store.clone());
        (store, engine)
    }

    #[test]
    fn test_patch_captures_full_snapshots() {
        let (_, engine) = seeded();
        let snapshot = engine
            .patch(
                "c",
                &Filter::by("ueId", "imsi-1"),
                &[PatchItem::replace("/a", json!(2))],
                None,
            )
            .unwrap();

        assert_eq!(snapshot.before, json!({"ueId": "imsi-1", "a": 1, "list": [1, 2]}));
        assert_eq!(snapshot.after, json!({"ueId": "imsi-1", "a": 2, "list": [1, 2]}));
    }

    #[test]
    fn test_patch_failure_is_modify_not_allowed() {
        let (store, engine) = seeded();
        let filter = Filter::by("ueId", "imsi-1");

        let result = engine.patch(
            "c",
            &filter,
            &[PatchItem::add("/b", json!(1)), PatchItem::remove("/nope")],
            None,
        );
        assert!(matches!(result, Err(DataRepoError::ModifyNotAllowed(_))));

        let stored = store.get_one("c", &filter).unwrap().unwrap();
        assert!(stored.get("b").is_none());
    }

    #[test]
    fn test_merge_snapshot() {
        let (_, engine) = seeded();
        let partial = json!({"a": 5}).as_object().cloned().unwrap();

        let snapshot = engine
            .merge("c", &Filter::by("ueId", "imsi-1"), &partial)
            .unwrap();
        assert_eq!(snapshot.before["a"], 1);
        assert_eq!(snapshot.after["a"], 5);
        assert_eq!(snapshot.after["list"], json!([1, 2]));
    }
}
