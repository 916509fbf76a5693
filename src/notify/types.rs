//! Notification event types.

use crate::subscriptions::SubscriptionId;
use crate::types::{OwnerKey, PatchItem, ResourceFamily};
use serde::{Deserialize, Serialize};

/// One change to a stored resource.
///
/// `before` and `after` are always complete documents, even when the patch
/// touched a single field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub owner: OwnerKey,
    /// Family of the changed resource; selects which change subscriptions
    /// hear about it.
    pub family: ResourceFamily,
    pub resource_uri: String,
    pub patch_operations: Vec<PatchItem>,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// An event addressed to one subscription's callback.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub subscription_id: SubscriptionId,
    pub target_uri: String,
    pub event: NotificationEvent,
}
