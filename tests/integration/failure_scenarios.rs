//! Failure handling of the tick loop
//!
//! Probe failures are data; storage failures end the run.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use netpulse::{
    config::Target,
    scheduler::SchedulerState,
    storage::{MemoryStore, SampleStore, StorageError, init_or_close},
};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_storage_failure_stops_run_and_closes_store() {
    let config = create_test_config(three_targets(), Duration::from_secs(1));

    let store = Arc::new(FailingStore::new(3));
    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(config, FakeProbe::instant(), store.clone(), reporter.clone());

    let result = scheduler.run().await;

    assert!(matches!(result, Err(StorageError::IoError(_))));
    assert!(store.was_closed());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    // the failed tick was neither retried nor displayed
    assert_eq!(store.appends.load(Ordering::SeqCst), 3);
    assert_eq!(reporter.ticks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_on_first_tick() {
    let config = create_test_config(three_targets(), Duration::from_secs(1));

    let store = Arc::new(FailingStore::new(1));
    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(config, FakeProbe::instant(), store.clone(), reporter.clone());

    let start = tokio::time::Instant::now();
    let result = scheduler.run().await;

    assert!(result.is_err());
    assert!(store.was_closed());
    assert!(reporter.ticks().is_empty());
    // terminated within the first tick, no waiting for another
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_probe_failures_never_stop_the_loop() {
    let mut config = create_test_config(
        vec![
            Target::new("Down", Some("192.0.2.1"), None),
            Target::new("Up", Some("10.0.0.1"), None),
        ],
        Duration::from_secs(1),
    );
    config.max_ticks = Some(20);

    let probe = FakeProbe {
        delay: Duration::from_millis(800),
        unreachable: vec!["192.0.2.1".to_string()],
    };

    let store = Arc::new(MemoryStore::new());
    let mut scheduler = build_scheduler(config, probe, store.clone(), RecordingReporter::default());

    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.ticks, 20);

    let samples = store.samples();
    assert_eq!(samples.len(), 40);
    for pair in samples.chunks(2) {
        assert_eq!(pair[0].ping_latency_ms, None);
        assert_eq!(pair[1].ping_latency_ms, Some(2.5));
    }
}

#[tokio::test]
async fn test_failed_init_closes_store_and_keeps_init_error() {
    let store = FailingStore::broken_medium();

    let result = init_or_close(&store).await;

    assert!(matches!(result, Err(StorageError::SchemaFailed(_))));
    assert!(store.was_closed());
}

#[tokio::test]
async fn test_successful_init_leaves_store_open() {
    let store = MemoryStore::new();

    init_or_close(&store).await.unwrap();

    assert!(!store.is_closed());
    store.append(&[]).await.unwrap();
}
