//! Patch engine.
//!
//! Two update forms are supported against a stored document:
//! - ordered RFC6902 operations, applied all or nothing
//! - RFC7396 partial merge documents, idempotent
//!
//! Every successful application yields a [`Snapshot`] with the complete
//! document before and after, which feeds change notification.

mod engine;
mod operations;

pub use engine::{PatchEngine, Snapshot};
pub use operations::{apply_merge, apply_patch, diff};
