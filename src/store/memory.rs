//! In-memory document store.

use super::{DocumentStore, Filter};
use crate::error::StoreError;
use crate::patch::{apply_merge, apply_patch};
use crate::types::{Document, PatchItem};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Collections of documents held in process memory.
///
/// Every trait call takes the collection map lock once, so each call is
/// atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Replace the matching document with the result of `update`.
    fn update_with<F>(&self, collection: &str, filter: &Filter, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Document) -> Result<Document, StoreError>,
    {
        let mut collections = self.collections.write();
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
            .ok_or_else(|| StoreError::NoMatch {
                collection: collection.to_string(),
            })?;

        *slot = update(slot)?;
        Ok(())
    }
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::PatchRejected(format!(
            "patched document is not an object: {}",
            other
        ))),
    }
}

impl DocumentStore for MemoryStore {
    fn get_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    fn get_many(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn put_one(&self, collection: &str, filter: &Filter, doc: Document) -> Result<bool, StoreError> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();

        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => {
                docs.push(doc);
                Ok(false)
            }
        }
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        if let Some(docs) = collections.get_mut(collection) {
            if let Some(pos) = docs.iter().position(|d| filter.matches(d)) {
                docs.remove(pos);
            }
        }
        Ok(())
    }

    fn json_patch(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &[PatchItem],
    ) -> Result<(), StoreError> {
        self.update_with(collection, filter, |current| {
            let patched = apply_patch(&Value::Object(current.clone()), patch)
                .map_err(|e| StoreError::PatchRejected(e.to_string()))?;
            into_document(patched)
        })
    }

    fn json_patch_extend(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &[PatchItem],
        subfield: &str,
    ) -> Result<(), StoreError> {
        self.update_with(collection, filter, |current| {
            let target = current
                .get(subfield)
                .cloned()
                .unwrap_or_else(|| Value::Object(Document::new()));
            let patched = apply_patch(&target, patch)
                .map_err(|e| StoreError::PatchRejected(e.to_string()))?;

            let mut updated = current.clone();
            updated.insert(subfield.to_string(), patched);
            Ok(updated)
        })
    }

    fn merge_patch(
        &self,
        collection: &str,
        filter: &Filter,
        partial: &Document,
    ) -> Result<(), StoreError> {
        self.update_with(collection, filter, |current| {
            let merged = apply_merge(
                &Value::Object(current.clone()),
                &Value::Object(partial.clone()),
            );
            into_document(merged)
        })
    }
}
