//! Slice configuration synchronizer.

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::plmn::PlmnSupportSet;
use super::signal::ConfigObserver;
use super::types::{NetworkSlice, NetworkSliceBatch, SmPolicyUpdateEntry};

/// Capacity of the queue between the synchronizer and the policy writer.
pub const POLICY_QUEUE_DEPTH: usize = 10;

/// Whether the minimal viable configuration is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigState {
    NoConfig,
    HasConfig,
}

impl ConfigState {
    pub fn has_config(self) -> bool {
        self == ConfigState::HasConfig
    }
}

/// Folds slice configuration batches into local state.
///
/// Serial: one batch at a time, in arrival order. For each batch new site
/// PLMNs join the supported set, one policy entry per subscriber and data
/// network is forwarded to the writer queue, and the observer is told the
/// resulting state. The observer hears about every batch, not only
/// transitions.
pub struct SliceConfigSynchronizer {
    plmns: Arc<PlmnSupportSet>,
    policy_tx: Sender<SmPolicyUpdateEntry>,
    observer: Arc<dyn ConfigObserver>,
    state: ConfigState,
    batches: u64,
}

impl SliceConfigSynchronizer {
    pub fn new(
        plmns: Arc<PlmnSupportSet>,
        policy_tx: Sender<SmPolicyUpdateEntry>,
        observer: Arc<dyn ConfigObserver>,
    ) -> Self {
        Self {
            plmns,
            policy_tx,
            observer,
            state: ConfigState::NoConfig,
            batches: 0,
        }
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    /// Batches processed so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Process one batch and emit the resulting state.
    ///
    /// Blocks while the policy queue is full and until the observer accepts
    /// the signal.
    pub fn process_batch(&mut self, batch: &NetworkSliceBatch) -> ConfigState {
        info!(slices = batch.network_slice.len(), "received slice configuration");

        for slice in &batch.network_slice {
            self.record_site_plmn(slice);
            self.forward_policy_entries(slice);
        }

        self.state = if self.plmns.is_empty() {
            ConfigState::NoConfig
        } else {
            ConfigState::HasConfig
        };
        self.batches += 1;

        self.observer.config_changed(self.state.has_config());
        info!(state = ?self.state, "sent config trigger");
        self.state
    }

    /// Consume batches until the stream disconnects.
    pub fn run(mut self, batches: Receiver<NetworkSliceBatch>) {
        for batch in batches.iter() {
            self.process_batch(&batch);
        }
        info!(batches = self.batches, "slice configuration stream closed");
    }

    fn record_site_plmn(&self, slice: &NetworkSlice) {
        debug!(slice = %slice.name, "network slice");
        let Some(site) = &slice.site else {
            return;
        };

        match &site.plmn {
            Some(plmn) => {
                if self.plmns.insert(plmn.clone()) {
                    info!(site = %site.site_name, plmn = %plmn, "added supported plmn");
                }
            }
            None => debug!(site = %site.site_name, "plmn not present in site"),
        }
    }

    fn forward_policy_entries(&self, slice: &NetworkSlice) {
        if slice.device_group.is_empty() {
            return;
        }

        let snssai = match slice.nssai.as_ref().map(|n| n.to_snssai()) {
            Some(Ok(snssai)) => snssai,
            Some(Err(e)) => {
                error!(slice = %slice.name, error = %e, "cannot derive sm policy entries");
                return;
            }
            None => {
                error!(slice = %slice.name, "slice has device groups but no nssai");
                return;
            }
        };

        for group in &slice.device_group {
            for imsi in &group.imsi {
                for domain in &group.ip_domain_details {
                    let entry = SmPolicyUpdateEntry {
                        imsi: imsi.clone(),
                        dnn: domain.dnn_name.clone(),
                        snssai: snssai.clone(),
                    };
                    if self.policy_tx.send(entry).is_err() {
                        warn!(imsi = %imsi, dnn = %domain.dnn_name, "policy writer gone, entry dropped");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::signal::ConfigSignal;
    use crate::sync::types::{DeviceGroup, IpDomain, Nssai, SiteInfo};
    use crate::types::{PlmnId, Snssai};
    use crossbeam_channel::bounded;

    fn slice(plmn: Option<PlmnId>, imsis: &[&str], dnns: &[&str]) -> NetworkSlice {
        NetworkSlice {
            name: "slice-1".into(),
            nssai: Some(Nssai::new("1", "010203")),
            site: Some(SiteInfo {
                site_name: "edge".into(),
                plmn,
            }),
            device_group: vec![DeviceGroup {
                name: "dg".into(),
                imsi: imsis.iter().map(|s| s.to_string()).collect(),
                ip_domain_details: dnns
                    .iter()
                    .map(|d| IpDomain {
                        name: "pool".into(),
                        dnn_name: d.to_string(),
                    })
                    .collect(),
            }],
        }
    }

    fn synchronizer(
        plmns: Arc<PlmnSupportSet>,
    ) -> (
        SliceConfigSynchronizer,
        Receiver<SmPolicyUpdateEntry>,
        Arc<ConfigSignal>,
    ) {
        let (tx, rx) = bounded(64);
        let signal = Arc::new(ConfigSignal::new());
        let sync = SliceConfigSynchronizer::new(plmns, tx, signal.clone());
        (sync, rx, signal)
    }

    #[test]
    fn test_entries_per_subscriber_and_dnn() {
        let (mut sync, rx, _) = synchronizer(Arc::new(PlmnSupportSet::new()));
        let batch = NetworkSliceBatch {
            network_slice: vec![slice(
                Some(PlmnId::new("001", "01")),
                &["1", "2"],
                &["internet", "ims"],
            )],
        };

        assert_eq!(sync.process_batch(&batch), ConfigState::HasConfig);

        let entries: Vec<_> = rx.try_iter().collect();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].imsi, "1");
        assert_eq!(entries[0].dnn, "internet");
        assert_eq!(entries[1].dnn, "ims");
        assert_eq!(entries[3].imsi, "2");
        assert!(entries.iter().all(|e| e.snssai == Snssai::new(1, "010203")));
    }

    #[test]
    fn test_empty_batch_emits_false() {
        let (mut sync, _rx, signal) = synchronizer(Arc::new(PlmnSupportSet::new()));

        assert_eq!(
            sync.process_batch(&NetworkSliceBatch::default()),
            ConfigState::NoConfig
        );
        let emission = signal.latest().unwrap();
        assert!(!emission.has_config);
        assert_eq!(emission.generation, 1);
    }

    #[test]
    fn test_bad_nssai_skips_slice_but_not_batch() {
        let (mut sync, rx, signal) = synchronizer(Arc::new(PlmnSupportSet::new()));

        let mut broken = slice(Some(PlmnId::new("001", "01")), &["1"], &["internet"]);
        broken.nssai = Some(Nssai::new("not-a-number", ""));
        let good = slice(None, &["9"], &["iot"]);

        let state = sync.process_batch(&NetworkSliceBatch {
            network_slice: vec![broken, good],
        });

        assert_eq!(state, ConfigState::HasConfig);
        let entries: Vec<_> = rx.try_iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].imsi, "9");
        assert!(signal.latest().unwrap().has_config);
    }

    #[test]
    fn test_seeded_plmns_count_as_config() {
        let plmns = Arc::new(PlmnSupportSet::with_plmns(vec![PlmnId::new("208", "93")]));
        let (mut sync, _rx, _) = synchronizer(plmns);

        assert_eq!(
            sync.process_batch(&NetworkSliceBatch::default()),
            ConfigState::HasConfig
        );
    }
}
