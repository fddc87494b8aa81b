//! Sample collection for a single tick
//!
//! ## Flow
//!
//! ```text
//! tick at T → sample CPU + RAM once → probe all targets concurrently → one Sample per target
//!                                       (ping ∥ http per target)       (configuration order)
//! ```
//!
//! Probe failures end up as empty fields of the sample; collection itself
//! cannot fail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{instrument, trace};

use crate::{
    Sample,
    config::{SamplerConfig, Target},
    probes::{HttpOutcome, PingOutcome, Probe},
    system::SystemSampler,
};

/// Probe results for one target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMeasurement {
    pub ping: PingOutcome,
    pub http: HttpOutcome,
}

pub struct SampleCollector {
    config: Arc<SamplerConfig>,
    probe: Arc<dyn Probe>,
    sampler: Box<dyn SystemSampler>,
}

impl SampleCollector {
    pub fn new(
        config: Arc<SamplerConfig>,
        probe: Arc<dyn Probe>,
        sampler: Box<dyn SystemSampler>,
    ) -> Self {
        Self {
            config,
            probe,
            sampler,
        }
    }

    /// Collect one sample per configured target, all stamped with `timestamp`
    ///
    /// The returned samples follow the configured target order, regardless of
    /// which probe finished first.
    #[instrument(skip(self), fields(targets = self.config.targets.len()))]
    pub async fn collect(&mut self, timestamp: DateTime<Utc>) -> Vec<Sample> {
        let cpu_percent = self.sampler.sample_cpu_percent();
        let ram_percent = self.sampler.sample_ram_percent();

        let probe = self.probe.as_ref();
        let measurements = join_all(
            self.config
                .targets
                .iter()
                .map(|target| measure_target(probe, target)),
        )
        .await;

        self.config
            .targets
            .iter()
            .zip(measurements)
            .map(|(target, measurement)| {
                trace!("{}: {measurement:?}", target.name);
                Sample {
                    timestamp,
                    hostname: self.config.host.hostname.clone(),
                    os: self.config.host.os.clone(),
                    scenario: self.config.scenario.clone(),
                    cpu_percent,
                    ram_percent,
                    target_name: target.name.clone(),
                    ping_latency_ms: measurement.ping.latency_ms(),
                    http_latency_ms: measurement.http.latency_ms(),
                    http_status_code: measurement.http.status_code(),
                }
            })
            .collect()
    }
}

/// Run ping and HTTP probes of one target side by side
pub async fn measure_target(probe: &dyn Probe, target: &Target) -> TargetMeasurement {
    let (ping, http) = tokio::join!(
        probe.measure_ping(target.host.as_deref()),
        probe.measure_http(target.url.as_deref()),
    );

    TargetMeasurement { ping, http }
}
