//! Document store contract.
//!
//! The repository persists every document through a [`DocumentStore`]. Each
//! call is independently atomic; nothing spans two calls. [`MemoryStore`] is
//! an in-process implementation used by tests and single-node deployments.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::types::{Document, PatchItem};
use serde_json::Value;

/// Store backend used by the repository.
pub trait DocumentStore: Send + Sync {
    /// First document in `collection` matching `filter`.
    fn get_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// All documents in `collection` matching `filter`, in insertion order.
    fn get_many(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Replace the matching document or insert `doc`. Returns whether a
    /// document already existed.
    fn put_one(&self, collection: &str, filter: &Filter, doc: Document) -> Result<bool, StoreError>;

    /// Delete the first matching document. Deleting nothing is not an error.
    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<(), StoreError>;

    /// Apply ordered operations to the matching document, all or nothing.
    fn json_patch(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &[PatchItem],
    ) -> Result<(), StoreError>;

    /// Apply ordered operations to one top-level sub-field of the matching
    /// document.
    fn json_patch_extend(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &[PatchItem],
        subfield: &str,
    ) -> Result<(), StoreError>;

    /// Merge a partial document into the matching document.
    fn merge_patch(
        &self,
        collection: &str,
        filter: &Filter,
        partial: &Document,
    ) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, PartialEq)]
enum Condition {
    Eq(Value),
    Exists,
}

/// Conjunction of field conditions. Field names may be dotted paths into
/// nested objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// Empty filter; matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the common per-subscriber filter.
    pub fn by(field: &str, value: impl Into<Value>) -> Self {
        Self::new().eq(field, value)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn exists(mut self, field: &str) -> Self {
        self.conditions.push((field.to_string(), Condition::Exists));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            let found = lookup(doc, field);
            match condition {
                Condition::Eq(expected) => found == Some(expected),
                Condition::Exists => found.is_some(),
            }
        })
    }
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
