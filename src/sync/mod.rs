//! Slice configuration synchronization.
//!
//! An external stream of network-slice batches is folded into the supported
//! PLMN set and into per-subscriber SM policy entries. The
//! [`SliceConfigSynchronizer`] processes batches serially and forwards
//! entries over a bounded queue to the [`SmPolicyWriter`]; after every batch
//! it tells a [`ConfigObserver`] whether the minimal configuration (at least
//! one supported PLMN) is present.
//!
//! Backpressure is blocking throughout: a full policy queue stalls the
//! synchronizer, and so does a rendezvous observer nobody is reading.

mod plmn;
mod signal;
mod synchronizer;
mod types;
mod writer;

pub use plmn::PlmnSupportSet;
pub use signal::{ConfigObserver, ConfigSignal, Emission};
pub use synchronizer::{ConfigState, SliceConfigSynchronizer, POLICY_QUEUE_DEPTH};
pub use types::{
    DeviceGroup, IpDomain, NetworkSlice, NetworkSliceBatch, Nssai, SiteInfo, SmPolicyUpdateEntry,
};
pub use writer::SmPolicyWriter;

use crate::error::Result;
use crate::store::DocumentStore;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Join handles of the running synchronization threads.
pub struct SyncHandles {
    /// Ends when the batch stream disconnects.
    pub synchronizer: JoinHandle<()>,
    /// Ends once the synchronizer is gone and the queue is drained. Yields
    /// the number of entries written.
    pub writer: JoinHandle<u64>,
}

/// Start the synchronizer and the policy writer on named threads.
pub fn spawn(
    plmns: Arc<PlmnSupportSet>,
    store: Arc<dyn DocumentStore>,
    observer: Arc<dyn ConfigObserver>,
    batches: Receiver<NetworkSliceBatch>,
) -> Result<SyncHandles> {
    let (policy_tx, policy_rx) = bounded(POLICY_QUEUE_DEPTH);

    let writer = SmPolicyWriter::new(store);
    let writer = thread::Builder::new()
        .name("sm-policy-writer".to_string())
        .spawn(move || writer.run(policy_rx))?;

    let synchronizer = SliceConfigSynchronizer::new(plmns, policy_tx, observer);
    let synchronizer = thread::Builder::new()
        .name("slice-config-sync".to_string())
        .spawn(move || synchronizer.run(batches))?;

    Ok(SyncHandles {
        synchronizer,
        writer,
    })
}
