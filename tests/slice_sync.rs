//! Slice configuration synchronization tests.

use crossbeam_channel::{bounded, unbounded};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use udr::sync::{
    spawn, ConfigState, DeviceGroup, IpDomain, NetworkSlice, NetworkSliceBatch, Nssai, SiteInfo,
    POLICY_QUEUE_DEPTH,
};
use udr::{
    ConfigSignal, DataRepository, DataResource, DocumentStore, MemoryStore, NoopNotifier, PlmnId,
    PlmnSupportSet, SliceConfigSynchronizer, Snssai, SubscriptionRegistry,
};

fn slice(name: &str, plmn: Option<PlmnId>, group: &str, imsis: &[&str], dnn: &str) -> NetworkSlice {
    NetworkSlice {
        name: name.to_string(),
        nssai: Some(Nssai::new("1", "010203")),
        site: Some(SiteInfo {
            site_name: "site-1".to_string(),
            plmn,
        }),
        device_group: vec![DeviceGroup {
            name: group.to_string(),
            imsi: imsis.iter().map(|s| s.to_string()).collect(),
            ip_domain_details: vec![IpDomain {
                name: "pool".to_string(),
                dnn_name: dnn.to_string(),
            }],
        }],
    }
}

fn batch(slices: Vec<NetworkSlice>) -> NetworkSliceBatch {
    NetworkSliceBatch {
        network_slice: slices,
    }
}

#[test]
fn test_two_batches_same_plmn() {
    let plmns = Arc::new(PlmnSupportSet::new());
    let (policy_tx, policy_rx) = unbounded();
    let (signal_tx, signal_rx) = bounded::<bool>(0);

    let mut sync =
        SliceConfigSynchronizer::new(Arc::clone(&plmns), policy_tx, Arc::new(signal_tx));

    let plmn = PlmnId::new("001", "01");
    let first = batch(vec![slice("s1", Some(plmn.clone()), "dg1", &["1"], "internet")]);
    let second = batch(vec![slice("s1", Some(plmn.clone()), "dg2", &["2"], "internet")]);

    let producer = thread::spawn(move || {
        sync.process_batch(&first);
        sync.process_batch(&second);
        sync
    });

    // Nobody reads the rendezvous link yet, so the first batch cannot finish.
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());
    assert_eq!(policy_rx.len(), 1);

    assert!(signal_rx.recv().unwrap());
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());

    assert!(signal_rx.recv().unwrap());
    let sync = producer.join().unwrap();

    assert_eq!(plmns.snapshot(), vec![plmn]);
    assert_eq!(sync.state(), ConfigState::HasConfig);

    let imsis: Vec<_> = policy_rx.try_iter().map(|e| e.imsi).collect();
    assert_eq!(imsis, vec!["1", "2"]);
}

#[test]
fn test_signal_emitted_on_every_batch() {
    let signal = Arc::new(ConfigSignal::new());
    let (policy_tx, _policy_rx) = unbounded();
    let mut sync = SliceConfigSynchronizer::new(
        Arc::new(PlmnSupportSet::new()),
        policy_tx,
        signal.clone(),
    );

    sync.process_batch(&NetworkSliceBatch::default());
    sync.process_batch(&NetworkSliceBatch::default());
    let emission = signal.latest().unwrap();
    assert_eq!(emission.generation, 2);
    assert!(!emission.has_config);

    sync.process_batch(&batch(vec![slice(
        "s1",
        Some(PlmnId::new("208", "93")),
        "dg",
        &[],
        "internet",
    )]));
    let emission = signal.latest().unwrap();
    assert_eq!(emission.generation, 3);
    assert!(emission.has_config);
}

#[test]
fn test_full_policy_queue_blocks_without_dropping() {
    let (policy_tx, policy_rx) = bounded(POLICY_QUEUE_DEPTH);
    let signal = Arc::new(ConfigSignal::new());
    let mut sync = SliceConfigSynchronizer::new(
        Arc::new(PlmnSupportSet::new()),
        policy_tx,
        signal.clone(),
    );

    let imsis: Vec<String> = (0..POLICY_QUEUE_DEPTH * 3).map(|i| i.to_string()).collect();
    let imsi_refs: Vec<&str> = imsis.iter().map(String::as_str).collect();
    let big = batch(vec![slice(
        "s1",
        Some(PlmnId::new("001", "01")),
        "dg",
        &imsi_refs,
        "internet",
    )]);

    let producer = thread::spawn(move || {
        sync.process_batch(&big);
        sync
    });

    // Producer cannot finish while the queue holds only its capacity.
    thread::sleep(Duration::from_millis(50));
    assert!(signal.latest().is_none());
    assert_eq!(policy_rx.len(), POLICY_QUEUE_DEPTH);

    let mut received = Vec::new();
    while received.len() < POLICY_QUEUE_DEPTH * 3 {
        received.push(policy_rx.recv().unwrap().imsi);
    }
    producer.join().unwrap();

    assert_eq!(received, imsis);
    assert!(signal.latest().unwrap().has_config);
}

#[test]
fn test_spawned_pipeline_writes_policy_documents() {
    let store = Arc::new(MemoryStore::new());
    let plmns = Arc::new(PlmnSupportSet::new());
    let signal = Arc::new(ConfigSignal::new());
    let (batch_tx, batch_rx) = unbounded();

    let handles = spawn(
        Arc::clone(&plmns),
        store.clone(),
        signal.clone(),
        batch_rx,
    )
    .unwrap();

    batch_tx
        .send(batch(vec![slice(
            "s1",
            Some(PlmnId::new("001", "01")),
            "dg",
            &["001010000000001", "001010000000002"],
            "internet",
        )]))
        .unwrap();
    batch_tx
        .send(batch(vec![slice("s1", None, "dg", &["001010000000001"], "ims")]))
        .unwrap();
    drop(batch_tx);

    handles.synchronizer.join().unwrap();
    assert_eq!(handles.writer.join().unwrap(), 3);
    assert_eq!(signal.latest().unwrap().generation, 2);

    let repo = DataRepository::new(
        store,
        Arc::new(SubscriptionRegistry::new()),
        Arc::new(NoopNotifier),
        "http://udr/nudr-dr/v1",
    );
    let slice_sel = Snssai::new(1, "010203");
    assert!(repo
        .sm_policy_data("imsi-001010000000001", Some(&slice_sel), Some("ims"))
        .is_ok());
    assert!(repo
        .sm_policy_data("imsi-001010000000001", Some(&slice_sel), Some("internet"))
        .is_ok());
    assert!(repo
        .sm_policy_data("imsi-001010000000002", Some(&slice_sel), Some("ims"))
        .is_err());
    assert_eq!(
        repo.store()
            .get_many(DataResource::SmPolicyData.collection(), &udr::Filter::new())
            .unwrap()
            .len(),
        2
    );
}
