//! Change notification.
//!
//! Every successful patch or merge produces exactly one
//! [`NotificationEvent`] carrying the owner, the canonical resource URI, the
//! applied operations and the complete document before and after. The
//! [`NotificationPipeline`] builds the event and hands it to a [`Notifier`];
//! [`SubscriptionNotifier`] is the registry-backed fan-out implementation.

mod dispatch;
mod pipeline;
mod types;

pub use dispatch::{SubscriptionNotifier, DEFAULT_DELIVERY_BUFFER};
pub use pipeline::{NoopNotifier, NotificationPipeline, Notifier};
pub use types::{Delivery, NotificationEvent};
