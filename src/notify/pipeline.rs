//! Change-notification pipeline.

use crate::patch::Snapshot;
use crate::types::{DataResource, OwnerKey, PatchItem};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::NotificationEvent;

/// Receives one event per successful mutation.
///
/// Fire-and-forget from the pipeline's point of view: delivery to callback
/// endpoints and any retry policy belong to the implementation.
pub trait Notifier: Send + Sync {
    fn notify_change(&self, event: &NotificationEvent);
}

/// Hands events to a channel consumer. Blocks while a bounded channel is
/// full.
impl Notifier for Sender<NotificationEvent> {
    fn notify_change(&self, event: &NotificationEvent) {
        if self.send(event.clone()).is_err() {
            warn!(resource_uri = %event.resource_uri, "notification consumer gone, event lost");
        }
    }
}

/// Discards every event.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_change(&self, _event: &NotificationEvent) {}
}

/// Builds notification events and forwards them to the [`Notifier`].
///
/// Called synchronously at the end of every successful mutation, exactly
/// once, whether or not anyone is subscribed. Not coupled to the store: a
/// crash between mutation and dispatch loses the event, never the write.
pub struct NotificationPipeline {
    api_root: String,
    notifier: Arc<dyn Notifier>,
    dispatched: AtomicU64,
}

impl NotificationPipeline {
    pub fn new(api_root: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            notifier,
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Canonical URI of a resource owned by `owner`.
    pub fn resource_uri(&self, owner: &OwnerKey, resource: DataResource) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_root,
            resource.family().segment(),
            owner,
            resource.path()
        )
    }

    /// Emit the event for one successful mutation.
    pub fn dispatch(
        &self,
        owner: &OwnerKey,
        resource: DataResource,
        patch_operations: Vec<PatchItem>,
        snapshot: Snapshot,
    ) {
        let event = NotificationEvent {
            owner: owner.clone(),
            family: resource.family(),
            resource_uri: self.resource_uri(owner, resource),
            patch_operations,
            before: snapshot.before,
            after: snapshot.after,
        };

        debug!(owner = %owner, resource_uri = %event.resource_uri, "dispatching change notification");
        self.notifier.notify_change(&event);
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    /// Events dispatched since startup.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }
}
