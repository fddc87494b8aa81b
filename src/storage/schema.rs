//! Table schema and persisted row representation
//!
//! ## Layout
//!
//! One append-only `metrics` table, one row per (tick, target) pair, keyed by
//! an auto-incrementing id. Nullable columns keep the difference between
//! "not configured" and "failed":
//!
//! | column             | skipped | failed | measured |
//! |--------------------|---------|--------|----------|
//! | `ping_latency_ms`  | NULL    | NULL   | latency  |
//! | `http_latency_ms`  | NULL    | NULL   | latency  |
//! | `http_status_code` | NULL    | 0      | status   |
//!
//! Timestamps are RFC 3339 UTC strings with microsecond precision, so they
//! sort lexicographically in chronological order.

use chrono::SecondsFormat;

use crate::Sample;

/// Idempotent table creation, safe on every start
pub const CREATE_METRICS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        hostname TEXT NOT NULL,
        os_system TEXT NOT NULL,
        scenario TEXT NOT NULL,
        cpu_percent REAL NOT NULL,
        ram_percent REAL NOT NULL,
        target_name TEXT NOT NULL,
        ping_latency_ms REAL,
        http_latency_ms REAL,
        http_status_code INTEGER
    )
"#;

pub const INSERT_SAMPLE: &str = r#"
    INSERT INTO metrics (
        timestamp, hostname, os_system, scenario, cpu_percent, ram_percent,
        target_name, ping_latency_ms, http_latency_ms, http_status_code
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// A sample in the shape it is bound to the insert statement
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub timestamp: String,
    pub hostname: String,
    pub os_system: String,
    pub scenario: String,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub target_name: String,
    pub ping_latency_ms: Option<f64>,
    pub http_latency_ms: Option<f64>,
    pub http_status_code: Option<i64>,
}

impl From<&Sample> for SampleRow {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            hostname: sample.hostname.clone(),
            os_system: sample.os.clone(),
            scenario: sample.scenario.clone(),
            cpu_percent: sample.cpu_percent,
            ram_percent: sample.ram_percent,
            target_name: sample.target_name.clone(),
            ping_latency_ms: sample.ping_latency_ms,
            http_latency_ms: sample.http_latency_ms,
            http_status_code: sample.http_status_code.map(i64::from),
        }
    }
}
