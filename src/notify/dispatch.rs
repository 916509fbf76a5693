//! Fan-out of change events to subscribed callbacks.

use crate::subscriptions::{Subscription, SubscriptionClass, SubscriptionRegistry};
use crate::types::ResourceFamily;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Arc;
use tracing::warn;

use super::pipeline::Notifier;
use super::types::{Delivery, NotificationEvent};

/// Default delivery queue depth.
pub const DEFAULT_DELIVERY_BUFFER: usize = 1000;

/// [`Notifier`] that resolves interested subscriptions from the registry
/// and queues one [`Delivery`] per match.
///
/// Interested means a data-change subscription of the event's family
/// (subscription data or policy data) whose filter criteria accept the
/// event's owner and list its resource URI.
/// Deliveries are best effort: a full or closed queue drops the delivery.
pub struct SubscriptionNotifier {
    registry: Arc<SubscriptionRegistry>,
    sender: Sender<Delivery>,
}

impl SubscriptionNotifier {
    /// Create a notifier and the receiving end of its delivery queue.
    pub fn new(registry: Arc<SubscriptionRegistry>, buffer_size: usize) -> (Self, Receiver<Delivery>) {
        let (sender, receiver) = bounded(buffer_size);
        (Self { registry, sender }, receiver)
    }

    fn interested(&self, event: &NotificationEvent) -> Vec<Subscription> {
        let Some(class) = change_class(event.family) else {
            return Vec::new();
        };

        self.registry.matching(class, |sub| {
            sub.filter_criteria
                .as_ref()
                .map(|f| f.matches(&event.owner, &event.resource_uri))
                .unwrap_or(false)
        })
    }
}

/// Subscription class watching changes of a resource family.
fn change_class(family: ResourceFamily) -> Option<SubscriptionClass> {
    match family {
        ResourceFamily::SubscriptionData => Some(SubscriptionClass::SubscriptionDataChange),
        ResourceFamily::PolicyData => Some(SubscriptionClass::PolicyDataChange),
        ResourceFamily::ApplicationData => None,
    }
}

impl Notifier for SubscriptionNotifier {
    fn notify_change(&self, event: &NotificationEvent) {
        for sub in self.interested(event) {
            let delivery = Delivery {
                subscription_id: sub.id,
                target_uri: sub.target_uri,
                event: event.clone(),
            };

            match self.sender.try_send(delivery) {
                Ok(()) => {}
                Err(TrySendError::Full(d)) => {
                    warn!(subscription = %d.subscription_id, "delivery queue full, dropping notification");
                }
                Err(TrySendError::Disconnected(d)) => {
                    warn!(subscription = %d.subscription_id, "delivery queue closed, dropping notification");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::{FilterCriteria, NewSubscription};
    use crate::types::OwnerKey;
    use serde_json::json;

    const URI: &str = "http://udr/nudr-dr/v1/subscription-data/imsi-1/pp-data";
    const POLICY_URI: &str = "http://udr/nudr-dr/v1/policy-data/ues/imsi-1/ue-policy-set";

    fn event(owner: &str) -> NotificationEvent {
        NotificationEvent {
            owner: OwnerKey::subscriber(owner),
            family: ResourceFamily::SubscriptionData,
            resource_uri: URI.to_string(),
            patch_operations: vec![],
            before: json!({}),
            after: json!({"x": 1}),
        }
    }

    fn watch(registry: &SubscriptionRegistry, ue_id: Option<&str>, target: &str) {
        registry.create(
            &OwnerKey::Global,
            SubscriptionClass::SubscriptionDataChange,
            NewSubscription::new(target).with_filter(FilterCriteria {
                ue_id: ue_id.map(String::from),
                monitored_resource_uris: vec![URI.to_string()],
            }),
        );
    }

    #[test]
    fn test_delivers_to_matching_subscriptions() {
        let registry = Arc::new(SubscriptionRegistry::new());
        watch(&registry, Some("imsi-1"), "http://a/cb");
        watch(&registry, Some("imsi-2"), "http://b/cb");
        watch(&registry, None, "http://c/cb");

        let (notifier, rx) = SubscriptionNotifier::new(registry, 16);
        notifier.notify_change(&event("imsi-1"));

        let targets: Vec<String> = rx.try_iter().map(|d| d.target_uri).collect();
        assert_eq!(targets, vec!["http://a/cb", "http://c/cb"]);
    }

    #[test]
    fn test_no_subscriptions_no_deliveries() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let (notifier, rx) = SubscriptionNotifier::new(registry, 16);

        notifier.notify_change(&event("imsi-1"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_delivery() {
        let registry = Arc::new(SubscriptionRegistry::new());
        watch(&registry, None, "http://a/cb");

        let (notifier, rx) = SubscriptionNotifier::new(registry, 1);
        notifier.notify_change(&event("imsi-1"));
        notifier.notify_change(&event("imsi-1"));

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_policy_data_change_reaches_policy_subscriptions() {
        let registry = Arc::new(SubscriptionRegistry::new());
        for class in [
            SubscriptionClass::PolicyDataChange,
            SubscriptionClass::SubscriptionDataChange,
        ] {
            registry.create(
                &OwnerKey::Global,
                class,
                NewSubscription::new(format!("http://{:?}/cb", class)).with_filter(
                    FilterCriteria {
                        ue_id: None,
                        monitored_resource_uris: vec![POLICY_URI.to_string()],
                    },
                ),
            );
        }

        let (notifier, rx) = SubscriptionNotifier::new(registry, 16);
        notifier.notify_change(&NotificationEvent {
            family: ResourceFamily::PolicyData,
            resource_uri: POLICY_URI.to_string(),
            ..event("imsi-1")
        });

        let targets: Vec<String> = rx.try_iter().map(|d| d.target_uri).collect();
        assert_eq!(targets, vec!["http://PolicyDataChange/cb"]);
    }

    #[test]
    fn test_application_data_has_no_change_class() {
        let registry = Arc::new(SubscriptionRegistry::new());
        watch(&registry, None, "http://a/cb");

        let (notifier, rx) = SubscriptionNotifier::new(registry, 16);
        notifier.notify_change(&NotificationEvent {
            family: ResourceFamily::ApplicationData,
            ..event("imsi-1")
        });
        assert!(rx.try_recv().is_err());
    }
}
