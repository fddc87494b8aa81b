//! End-to-end behavior of the tick loop
//!
//! These tests run on tokio's paused clock, so hundreds of one-second ticks
//! finish instantly and cadence can be checked exactly.

use std::sync::Arc;
use std::time::Duration;

use netpulse::{
    config::Target,
    scheduler::{SchedulerState, StopReason},
    storage::MemoryStore,
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

const INTERVAL: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn test_every_tick_has_one_sample_per_target_in_order() {
    let mut config = create_test_config(three_targets(), INTERVAL);
    config.max_ticks = Some(5);

    let store = Arc::new(MemoryStore::new());
    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(config, FakeProbe::instant(), store.clone(), reporter.clone());

    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.reason, StopReason::TickLimit);

    let ticks = reporter.ticks();
    assert_eq!(ticks.len(), 5);
    for (_, samples) in &ticks {
        let names: Vec<_> = samples.iter().map(|s| s.target_name.as_str()).collect();
        assert_eq!(names, vec!["Gateway", "Google_DNS", "Intranet"]);
    }

    // storage received the same rows in the same order
    let stored: Vec<_> = store.samples();
    let displayed: Vec<_> = ticks.into_iter().flat_map(|(_, samples)| samples).collect();
    assert_eq!(stored, displayed);
}

#[tokio::test(start_paused = true)]
async fn test_resources_shared_within_tick() {
    let mut config = create_test_config(three_targets(), INTERVAL);
    config.max_ticks = Some(4);

    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::instant(),
        Arc::new(MemoryStore::new()),
        reporter.clone(),
    );
    scheduler.run().await.unwrap();

    for (tick, (_, samples)) in reporter.ticks().iter().enumerate() {
        let first = &samples[0];
        assert!(samples.iter().all(|s| s.timestamp == first.timestamp));
        assert!(samples.iter().all(|s| s.cpu_percent == first.cpu_percent));
        assert!(samples.iter().all(|s| s.ram_percent == first.ram_percent));
        // one reading per tick
        assert_eq!(first.cpu_percent, (tick + 1) as f64);
    }
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_host_keeps_cadence() {
    let timeout = Duration::from_millis(800);
    let mut config = create_test_config(
        vec![Target::new("Blackhole", Some("192.0.2.1"), None)],
        INTERVAL,
    );
    config.probe_timeout = timeout;
    config.max_ticks = Some(100);

    let probe = FakeProbe {
        delay: timeout,
        unreachable: vec!["192.0.2.1".to_string()],
    };

    let reporter = RecordingReporter::default();
    let mut scheduler =
        build_scheduler(config, probe, Arc::new(MemoryStore::new()), reporter.clone());
    scheduler.run().await.unwrap();

    let ticks = reporter.ticks();
    assert_eq!(ticks.len(), 100);
    assert!(
        ticks
            .iter()
            .all(|(_, samples)| samples[0].ping_latency_ms.is_none())
    );

    let tolerance = Duration::from_millis(20);
    for gap in reporter.gaps() {
        assert!(
            gap.abs_diff(INTERVAL) <= tolerance,
            "tick gap {gap:?} drifted from {INTERVAL:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_host_only_target_never_reports_http() {
    let mut config = create_test_config(
        vec![Target::new("Gateway", Some("10.0.0.1"), None)],
        INTERVAL,
    );
    config.max_ticks = Some(10);

    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::instant(),
        Arc::new(MemoryStore::new()),
        reporter.clone(),
    );
    scheduler.run().await.unwrap();

    for (_, samples) in reporter.ticks() {
        let sample = &samples[0];
        assert!(sample.ping_latency_ms.is_none_or(|ms| ms > 0.0));
        assert_eq!(sample.http_latency_ms, None);
        assert_eq!(sample.http_status_code, None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_overrunning_ticks_start_immediately() {
    let mut config = create_test_config(
        vec![Target::new("Slow", Some("10.0.0.9"), None)],
        INTERVAL,
    );
    config.max_ticks = Some(4);

    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::hanging(Duration::from_millis(1500)),
        Arc::new(MemoryStore::new()),
        reporter.clone(),
    );
    scheduler.run().await.unwrap();

    // no sleep between overrunning ticks, and no burst to catch up either
    for gap in reporter.gaps() {
        assert_eq!(gap, Duration::from_millis(1500));
    }
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_probe_stops_within_timeout() {
    let config = create_test_config(three_targets(), INTERVAL);

    let store = Arc::new(MemoryStore::new());
    let reporter = RecordingReporter::default();
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::hanging(Duration::from_millis(800)),
        store.clone(),
        reporter.clone(),
    );

    let cancel = scheduler.cancellation_token();
    tokio::spawn(async move {
        // second tick starts at 1.0s, its probes are still running at 1.3s
        tokio::time::sleep(Duration::from_millis(1300)).await;
        cancel.cancel();
    });

    let start = tokio::time::Instant::now();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.reason, StopReason::Interrupted);
    assert_eq!(summary.ticks, 1);
    assert_eq!(start.elapsed(), Duration::from_millis(1300));
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    // the unfinished tick left nothing behind
    assert_eq!(store.samples().len(), 3);
    assert!(store.is_closed());
}
