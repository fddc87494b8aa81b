use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use netpulse::{
    HostIdentity,
    collector::SampleCollector,
    config::{SamplerConfig, Target, default_targets, parse_seconds},
    probes::NetworkProbe,
    reporter::{OutputFormat, stdout_reporter},
    scheduler::{Scheduler, StopReason},
    storage::{MemoryStore, SampleStore, init_or_close},
    system::SysinfoSampler,
    util::{get_database, get_scenario},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Periodically samples host resources and target reachability")]
struct Args {
    /// Scenario label stored with every sample
    #[arg(short, long)]
    scenario: Option<String>,

    /// Seconds between tick starts
    #[arg(short, long, default_value = "1.0", value_parser = parse_seconds)]
    interval: Duration,

    /// Per-probe timeout in seconds
    #[arg(long, default_value = "0.8", value_parser = parse_seconds)]
    timeout: Duration,

    /// Target as NAME[,host=HOST][,url=URL], repeat for more targets
    #[arg(short, long = "target")]
    targets: Vec<Target>,

    /// SQLite database file (default: metrics_<hostname>.db)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Console output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Keep samples in memory only
    #[arg(long)]
    in_memory: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = filter::Targets::new().with_targets(vec![("netpulse", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = Arc::new(build_config(&args, HostIdentity::discover())?);
    info!(
        "sampling {} targets every {:?} on {} ({})",
        config.targets.len(),
        config.interval,
        config.host.hostname,
        config.host.os
    );

    let store = open_store(&config, args.in_memory).await?;
    init_or_close(store.as_ref())
        .await
        .context("failed to prepare the sample store")?;

    let probe = NetworkProbe::new(config.probe_timeout).context("failed to build HTTP client")?;
    let collector = SampleCollector::new(
        config.clone(),
        Arc::new(probe),
        Box::new(SysinfoSampler::new()),
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut scheduler = Scheduler::new(
        config,
        collector,
        store,
        stdout_reporter(args.format),
        cancel,
    );

    let summary = scheduler
        .run()
        .await
        .context("sampling stopped after a storage failure")?;

    match summary.reason {
        StopReason::Interrupted => info!("interrupted after {} ticks", summary.ticks),
        StopReason::TickLimit => info!("finished {} ticks", summary.ticks),
    }

    Ok(())
}

fn build_config(args: &Args, host: HostIdentity) -> anyhow::Result<SamplerConfig> {
    let targets = if args.targets.is_empty() {
        debug!("no targets given, using defaults");
        default_targets()
    } else {
        args.targets.clone()
    };

    let scenario = args.scenario.clone().unwrap_or_else(get_scenario);
    let mut config = SamplerConfig::new(scenario, host, targets);
    config.interval = args.interval;
    config.probe_timeout = args.timeout;
    config.max_ticks = args.ticks;
    config.database = args
        .database
        .clone()
        .unwrap_or_else(|| get_database(&config.host.hostname));

    Ok(config.validate()?)
}

#[cfg(feature = "storage-sqlite")]
async fn open_store(config: &SamplerConfig, in_memory: bool) -> anyhow::Result<Arc<dyn SampleStore>> {
    use netpulse::storage::sqlite::SqliteStore;

    if in_memory {
        info!("keeping samples in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = SqliteStore::open(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.display()))?;
    info!("writing samples to {}", store.path());
    Ok(Arc::new(store))
}

#[cfg(not(feature = "storage-sqlite"))]
async fn open_store(_config: &SamplerConfig, _in_memory: bool) -> anyhow::Result<Arc<dyn SampleStore>> {
    info!("built without SQLite support, keeping samples in memory only");
    Ok(Arc::new(MemoryStore::new()))
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
            Err(e) => error!("failed to listen for interrupt: {e}"),
        }
    });
}
