pub mod collector;
pub mod config;
pub mod probes;
pub mod reporter;
pub mod scheduler;
pub mod storage;
pub mod system;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// One measurement row: a single target observed during a single tick.
///
/// All samples produced by the same tick share `timestamp`, `cpu_percent`
/// and `ram_percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub os: String,
    pub scenario: String,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub target_name: String,
    /// `None` when no host is configured or the ping failed.
    pub ping_latency_ms: Option<f64>,
    /// `None` when no url is configured or the request failed.
    pub http_latency_ms: Option<f64>,
    /// `None` when no url is configured, `Some(0)` when the request got no response.
    pub http_status_code: Option<u16>,
}

/// Identity of the measuring host, stamped on every sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub hostname: String,
    pub os: String,
}

impl HostIdentity {
    pub fn new(hostname: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            os: os.into(),
        }
    }

    pub fn discover() -> Self {
        Self {
            hostname: System::host_name().unwrap_or_else(|| String::from("unknown")),
            os: os_family(std::env::consts::OS)
                .map(String::from)
                .or_else(System::name)
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
        }
    }
}

/// Platform family for a `std::env::consts::OS` value, as reported by `uname -s`.
pub fn os_family(os: &str) -> Option<&'static str> {
    match os {
        "linux" => Some("Linux"),
        "macos" => Some("Darwin"),
        "windows" => Some("Windows"),
        "freebsd" => Some("FreeBSD"),
        "netbsd" => Some("NetBSD"),
        "openbsd" => Some("OpenBSD"),
        _ => None,
    }
}
