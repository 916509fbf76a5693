//! Subscription registry for change notifications.
//!
//! Callers register interest in future changes to repository resources.
//! Subscriptions are grouped per owner (a subscriber, a subscriber group or
//! the global scope) and identified per class by a monotonically increasing
//! id that is never reused. They live until explicitly deleted.
//!
//! # Example
//!
//! ```ignore
//! let registry = SubscriptionRegistry::new();
//! let owner = OwnerKey::subscriber("imsi-001010000000001");
//!
//! let sub = registry.create(
//!     &owner,
//!     SubscriptionClass::Sdm,
//!     NewSubscription::new("http://udm.example/callback"),
//! );
//! let same = registry.get(&owner, SubscriptionClass::Sdm, sub.id)?;
//! registry.delete(&owner, SubscriptionClass::Sdm, sub.id)?;
//! ```

mod registry;
mod types;

pub use registry::SubscriptionRegistry;
pub use types::{
    Created, FilterCriteria, NewSubscription, Subscription, SubscriptionClass, SubscriptionId,
};
