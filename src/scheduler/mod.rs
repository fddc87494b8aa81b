//! Tick scheduler - drives the sampling loop
//!
//! ## Message Flow
//!
//! ```text
//! Ticker → SampleCollector::collect → SampleStore::append → Reporter::display → wait for next tick
//!   ↑
//!   └─── CancellationToken (Ctrl-C)
//! ```
//!
//! ## Lifecycle
//!
//! `Idle → Running → Stopped`. The loop leaves `Running` when
//! - the cancellation token fires (between ticks or while probing): clean stop
//! - the configured tick limit is reached: clean stop
//! - an append fails: the storage error is returned
//!
//! The store is closed on every one of these paths.

pub mod ticker;

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    collector::SampleCollector,
    config::SamplerConfig,
    reporter::Reporter,
    storage::{SampleStore, StorageResult},
};

use self::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Why a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks whose samples were persisted
    pub ticks: u64,
    pub reason: StopReason,
}

pub struct Scheduler {
    config: Arc<SamplerConfig>,
    collector: SampleCollector,
    store: Arc<dyn SampleStore>,
    reporter: Box<dyn Reporter>,
    cancel: CancellationToken,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        config: Arc<SamplerConfig>,
        collector: SampleCollector,
        store: Arc<dyn SampleStore>,
        reporter: Box<dyn Reporter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            collector,
            store,
            reporter,
            cancel,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Token that stops the loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run ticks until cancelled, the tick limit is hit or storage fails
    ///
    /// The store is closed before this returns, whatever the outcome.
    #[instrument(skip(self), fields(scenario = %self.config.scenario))]
    pub async fn run(&mut self) -> StorageResult<RunSummary> {
        debug!(
            "starting scheduler: interval {:?}, probe timeout {:?}, {} targets",
            self.config.interval,
            self.config.probe_timeout,
            self.config.targets.len()
        );
        self.state = SchedulerState::Running;

        let result = self.run_ticks().await;

        if let Err(e) = &result {
            error!("stopping after storage failure: {e}");
        }

        match self.store.stats().await {
            Ok(stats) => info!("{}", stats.description),
            Err(e) => debug!("could not read store stats: {e}"),
        }

        if let Err(e) = self.store.close().await {
            error!("error closing store: {e}");
        }

        self.state = SchedulerState::Stopped;
        debug!("scheduler stopped");

        result
    }

    async fn run_ticks(&mut self) -> StorageResult<RunSummary> {
        let mut ticker = Ticker::new(self.config.interval, self.cancel.clone());
        let mut ticks = 0u64;

        let summary = |ticks, reason| RunSummary { ticks, reason };

        if self.config.max_ticks == Some(0) {
            debug!("tick limit of 0, nothing to sample");
            return Ok(summary(0, StopReason::TickLimit));
        }

        loop {
            let Some(started) = ticker.tick().await else {
                debug!("cancelled while waiting for the next tick");
                return Ok(summary(ticks, StopReason::Interrupted));
            };

            let timestamp = Utc::now();

            let samples = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("cancelled while probing, dropping unfinished tick");
                    return Ok(summary(ticks, StopReason::Interrupted));
                }
                samples = self.collector.collect(timestamp) => samples,
            };

            self.store.append(&samples).await?;
            self.reporter.display(&samples);
            ticks += 1;

            let elapsed = started.elapsed();
            if elapsed > self.config.interval {
                warn!(
                    "tick took {elapsed:?}, longer than the {:?} interval",
                    self.config.interval
                );
            }

            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                debug!("tick limit of {ticks} reached");
                return Ok(summary(ticks, StopReason::TickLimit));
            }
        }
    }
}
