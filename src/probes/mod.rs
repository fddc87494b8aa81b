//! Reachability probes
//!
//! A probe never fails with an error: every call yields an outcome value that
//! says whether the probe was skipped (nothing configured), failed (no
//! answer within the timeout, resolution or socket error) or produced a
//! measurement.
//!
//! ## Probes
//!
//! - **ICMP echo** ([`ping::IcmpPinger`]): round-trip latency to a host
//! - **HTTP GET** ([`http::HttpProber`]): latency until response headers plus status code
//!
//! Both are bounded by the configured probe timeout independently of the
//! scheduler, so a hung target can never stall a tick for longer than that.

pub mod http;
pub mod ping;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use self::http::HttpProber;
use self::ping::IcmpPinger;

/// Why a probe produced no measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFailure {
    /// No answer within the probe timeout
    Timeout,

    /// Host name could not be resolved
    Resolve(String),

    /// ICMP socket could not be opened or used
    Socket(String),

    /// HTTP request failed before a response arrived (connect, TLS, invalid url, ...)
    Request(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "timed out"),
            ProbeFailure::Resolve(msg) => write!(f, "failed to resolve host: {}", msg),
            ProbeFailure::Socket(msg) => write!(f, "socket error: {}", msg),
            ProbeFailure::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

/// Result of a single ICMP echo probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PingOutcome {
    /// No host configured, nothing was sent
    Skipped,
    Failed(ProbeFailure),
    Replied { latency_ms: f64 },
}

impl PingOutcome {
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            PingOutcome::Replied { latency_ms } => Some(*latency_ms),
            PingOutcome::Skipped | PingOutcome::Failed(_) => None,
        }
    }
}

/// Result of a single HTTP GET probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HttpOutcome {
    /// No url configured, nothing was requested
    Skipped,
    Failed(ProbeFailure),
    /// Any response counts, whatever its status code
    Responded { latency_ms: f64, status: u16 },
}

impl HttpOutcome {
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            HttpOutcome::Responded { latency_ms, .. } => Some(*latency_ms),
            HttpOutcome::Skipped | HttpOutcome::Failed(_) => None,
        }
    }

    /// Persisted status: `None` when skipped, `Some(0)` when attempted without response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpOutcome::Skipped => None,
            HttpOutcome::Failed(_) => Some(0),
            HttpOutcome::Responded { status, .. } => Some(*status),
        }
    }
}

/// Reachability checks against a single target
///
/// Implementations must return within their timeout and must never panic on
/// network errors.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn measure_ping(&self, host: Option<&str>) -> PingOutcome;

    async fn measure_http(&self, url: Option<&str>) -> HttpOutcome;
}

/// The real network probe: ICMP echo and HTTP GET
pub struct NetworkProbe {
    pinger: IcmpPinger,
    http: HttpProber,
    timeout: Duration,
}

impl NetworkProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            pinger: IcmpPinger::new(),
            http: HttpProber::new(timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn measure_ping(&self, host: Option<&str>) -> PingOutcome {
        match host {
            Some(host) => self.pinger.ping(host, self.timeout).await,
            None => PingOutcome::Skipped,
        }
    }

    async fn measure_http(&self, url: Option<&str>) -> HttpOutcome {
        match url {
            Some(url) => self.http.get(url, self.timeout).await,
            None => HttpOutcome::Skipped,
        }
    }
}
