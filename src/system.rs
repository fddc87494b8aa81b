//! Local resource usage
//!
//! CPU usage is a delta between two refreshes, so the sampler keeps its
//! `sysinfo::System` alive between ticks and primes it on construction: the
//! first tick reports usage since startup instead of a meaningless zero.

use sysinfo::System;
use tracing::trace;

use crate::util::round_to;

pub trait SystemSampler: Send {
    /// Global CPU utilization (percent) since the previous call
    fn sample_cpu_percent(&mut self) -> f64;

    /// Physical memory in use (percent)
    fn sample_ram_percent(&mut self) -> f64;
}

pub struct SysinfoSampler {
    sys: System,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self { sys }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for SysinfoSampler {
    fn sample_cpu_percent(&mut self) -> f64 {
        self.sys.refresh_cpu_usage();
        let usage = round_to(self.sys.global_cpu_usage() as f64, 1);
        trace!("cpu usage: {usage}%");
        usage
    }

    fn sample_ram_percent(&mut self) -> f64 {
        self.sys.refresh_memory();
        let usage = memory_percent(self.sys.total_memory(), self.sys.available_memory());
        trace!("memory usage: {usage}%");
        usage
    }
}

/// Share of memory that is not available, rounded to one decimal.
pub fn memory_percent(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let used = total.saturating_sub(available);
    round_to(used as f64 / total as f64 * 100.0, 1)
}
