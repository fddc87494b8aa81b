//! Integration tests for SQLite persistence
//!
//! These tests verify that:
//! - Ticks land in the table in target order, sharing timestamp and resources
//! - Table creation is idempotent across restarts
//! - A tick is written completely or not at all

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netpulse::{
    Sample,
    storage::{SampleStore, StorageError, sqlite::SqliteStore},
};
use pretty_assertions::assert_eq;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tempfile::tempdir;

use crate::helpers::*;

type StoredRow = (
    i64,
    String,
    String,
    f64,
    f64,
    Option<f64>,
    Option<f64>,
    Option<i64>,
);

async fn inspect(db_path: &Path) -> Pool<Sqlite> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(SqliteConnectOptions::new().filename(db_path))
        .await
        .unwrap()
}

async fn read_rows(pool: &Pool<Sqlite>) -> Vec<StoredRow> {
    sqlx::query_as(
        r#"
        SELECT id, timestamp, target_name, cpu_percent, ram_percent,
               ping_latency_ms, http_latency_ms, http_status_code
        FROM metrics ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

fn tick(targets: &[&str]) -> Vec<Sample> {
    let timestamp = Utc::now();
    targets
        .iter()
        .map(|name| Sample {
            timestamp,
            hostname: "probe-01".to_string(),
            os: "Linux".to_string(),
            scenario: "integration".to_string(),
            cpu_percent: 3.0,
            ram_percent: 40.0,
            target_name: name.to_string(),
            ping_latency_ms: Some(1.25),
            http_latency_ms: None,
            http_status_code: None,
        })
        .collect()
}

#[tokio::test]
async fn test_scheduler_persists_ticks() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("metrics_probe-01.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    store.init().await.unwrap();

    let mut config = create_test_config(three_targets(), Duration::from_millis(50));
    config.max_ticks = Some(3);
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::instant(),
        Arc::new(store),
        RecordingReporter::default(),
    );
    scheduler.run().await.unwrap();

    let pool = inspect(&db_path).await;
    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 9);

    for chunk in rows.chunks(3) {
        let names: Vec<_> = chunk.iter().map(|r| r.2.as_str()).collect();
        assert_eq!(names, vec!["Gateway", "Google_DNS", "Intranet"]);

        assert!(chunk.iter().all(|r| r.1 == chunk[0].1));
        assert!(chunk.iter().all(|r| r.3 == chunk[0].3 && r.4 == chunk[0].4));

        // ping only
        assert_eq!((chunk[0].5, chunk[0].6, chunk[0].7), (Some(2.5), None, None));
        // ping and http
        assert_eq!((chunk[1].5, chunk[1].6, chunk[1].7), (Some(2.5), Some(35.0), Some(200)));
        // http only
        assert_eq!((chunk[2].5, chunk[2].6, chunk[2].7), (None, Some(35.0), Some(200)));
    }

    // ticks in chronological order
    assert!(rows.windows(2).all(|w| w[0].1 <= w[1].1));
}

#[tokio::test]
async fn test_init_is_idempotent_across_restarts() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("metrics.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    store.init().await.unwrap();
    store.append(&tick(&["a", "b"])).await.unwrap();
    store.close().await.unwrap();

    let before = read_rows(&inspect(&db_path).await).await;

    let store = SqliteStore::open(&db_path).await.unwrap();
    store.init().await.unwrap();
    store.init().await.unwrap();

    assert_eq!(store.stats().await.unwrap().rows, 2);
    assert_eq!(read_rows(&inspect(&db_path).await).await, before);

    store.append(&tick(&["c"])).await.unwrap();
    let after = read_rows(&inspect(&db_path).await).await;
    assert_eq!(after.len(), 3);
    assert!(after[2].0 > after[1].0);
}

#[tokio::test]
async fn test_failed_append_leaves_no_partial_tick() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("metrics.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    store.init().await.unwrap();
    store.append(&tick(&["a", "b", "c"])).await.unwrap();

    // fault injection: the second row of the next tick aborts the insert
    let pool = inspect(&db_path).await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_poison BEFORE INSERT ON metrics
        WHEN NEW.target_name = 'poison'
        BEGIN
            SELECT RAISE(ABORT, 'simulated media failure');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = store.append(&tick(&["a", "poison", "c"])).await;
    assert!(matches!(result, Err(StorageError::QueryFailed(_))));

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 3, "none of the failed tick's rows may remain");

    // the store keeps working for the next tick
    store.append(&tick(&["a", "b", "c"])).await.unwrap();
    assert_eq!(read_rows(&pool).await.len(), 6);
}

#[tokio::test]
async fn test_store_closed_after_run() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("metrics.db");

    let store = Arc::new(SqliteStore::open(&db_path).await.unwrap());
    store.init().await.unwrap();

    let mut config = create_test_config(three_targets(), Duration::from_millis(20));
    config.max_ticks = Some(1);
    let mut scheduler = build_scheduler(
        config,
        FakeProbe::instant(),
        store.clone(),
        RecordingReporter::default(),
    );
    scheduler.run().await.unwrap();

    let result = store.append(&tick(&["late"])).await;
    assert!(matches!(result, Err(StorageError::Closed)));
}
