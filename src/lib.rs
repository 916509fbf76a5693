//! # UDR
//!
//! Core of a unified data repository: subscriber, policy and application
//! documents kept in a document store, with change notification and slice
//! configuration sync.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: per-owner registrations of interest with
//!   never-reused ids per class
//! - **Patches**: ordered RFC6902 operations or RFC7396 merges, each
//!   producing full before/after snapshots
//! - **Notifications**: exactly one event per successful mutation, handed to
//!   a [`Notifier`]
//! - **Slice sync**: a serial worker folding slice configuration into the
//!   supported PLMN set and SM policy documents, with a level-triggered
//!   configuration signal
//!
//! ## Example
//!
//! ```ignore
//! use udr::{DataRepository, MemoryStore, NoopNotifier, SubscriptionRegistry, UdrConfig};
//!
//! let config = UdrConfig::load("udrcfg.toml")?;
//! let repo = DataRepository::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SubscriptionRegistry::new()),
//!     Arc::new(NoopNotifier),
//!     config.api_root(),
//! );
//!
//! repo.put("imsi-001010000000001", DataResource::PpData, doc)?;
//! repo.patch("imsi-001010000000001", DataResource::PpData, &items)?;
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod notify;
pub mod patch;
pub mod repository;
pub mod store;
pub mod subscriptions;
pub mod sync;
pub mod types;

// Re-exports
pub use config::UdrConfig;
pub use error::{DataRepoError, ProblemDetails, Result, StoreError};
pub use filter::{DocumentQuery, InfluenceDataQuery, InfluenceSubsQuery, QueryParams};
pub use notify::{
    Delivery, NoopNotifier, NotificationEvent, NotificationPipeline, Notifier,
    SubscriptionNotifier,
};
pub use patch::{apply_merge, apply_patch, PatchEngine, Snapshot};
pub use repository::{DataRepository, PutOutcome};
pub use store::{DocumentStore, Filter, MemoryStore};
pub use subscriptions::{
    Created, FilterCriteria, NewSubscription, Subscription, SubscriptionClass, SubscriptionId,
    SubscriptionRegistry,
};
pub use sync::{
    ConfigObserver, ConfigSignal, ConfigState, NetworkSliceBatch, PlmnSupportSet,
    SliceConfigSynchronizer, SmPolicyWriter,
};
pub use types::*;
