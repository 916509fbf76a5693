//! Patch application on in-memory documents.

use crate::error::{DataRepoError, Result};
use crate::types::PatchItem;
use serde_json::Value;

/// Apply ordered operations to a copy of `doc`.
///
/// All or nothing: if any operation fails the input is untouched and the
/// error is `ModifyNotAllowed`.
pub fn apply_patch(doc: &Value, items: &[PatchItem]) -> Result<Value> {
    let patch: json_patch::Patch = serde_json::from_value(serde_json::to_value(items)?)
        .map_err(|_| DataRepoError::ModifyNotAllowed("PatchItem attributes are invalid".into()))?;

    let mut patched = doc.clone();
    json_patch::patch(&mut patched, &patch).map_err(|e| {
        DataRepoError::ModifyNotAllowed(format!("Occur error when applying PatchItem: {}", e))
    })?;

    Ok(patched)
}

/// Merge a partial document into a copy of `doc` (RFC7396).
///
/// Fields named in `partial` overwrite their stored counterparts, nested
/// objects merge recursively, `null` removes a field.
pub fn apply_merge(doc: &Value, partial: &Value) -> Value {
    let mut merged = doc.clone();
    json_patch::merge(&mut merged, partial);
    merged
}

/// Ordered operations that turn `before` into `after`.
pub fn diff(before: &Value, after: &Value) -> Result<Vec<PatchItem>> {
    let patch = json_patch::diff(before, after);
    Ok(serde_json::from_value(serde_json::to_value(&patch)?)?)
}
