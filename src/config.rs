use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::HostIdentity;
use crate::util::{default_database, get_default_interval, get_default_probe_timeout};

/// A probed endpoint. `host` is pinged, `url` is fetched with GET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub host: Option<String>,
    pub url: Option<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, host: Option<&str>, url: Option<&str>) -> Self {
        Self {
            name: name.into(),
            host: host.map(String::from),
            url: url.map(String::from),
        }
    }

    /// A target with neither host nor url only ever yields empty measurements.
    pub fn is_probed(&self) -> bool {
        self.host.is_some() || self.url.is_some()
    }
}

/// Parses `NAME[,host=HOST][,url=URL]`.
impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() || name.contains('=') {
            return Err(ConfigError::EmptyTargetName);
        }

        let mut target = Target::new(name, None, None);

        for part in parts {
            match part.split_once('=') {
                Some(("host", host)) if !host.is_empty() => target.host = Some(host.to_string()),
                Some(("url", url)) if !url.is_empty() => target.url = Some(url.to_string()),
                _ => return Err(ConfigError::InvalidTarget(s.to_string())),
            }
        }

        Ok(target)
    }
}

/// Targets probed when none are configured explicitly.
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new("Gateway", Some("172.18.11.254"), None),
        Target::new("Google_DNS", Some("8.8.8.8"), Some("https://www.google.com")),
    ]
}

/// Immutable run configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Static label stamped on every sample of this run
    pub scenario: String,

    /// Start-to-start period between ticks
    pub interval: Duration,

    /// Upper bound for a single ping or HTTP probe
    pub probe_timeout: Duration,

    /// Probed targets, in display and persistence order
    pub targets: Vec<Target>,

    /// Identity of the measuring host
    pub host: HostIdentity,

    /// SQLite database file
    pub database: PathBuf,

    /// Stop after this many ticks (unbounded when `None`)
    pub max_ticks: Option<u64>,
}

impl SamplerConfig {
    pub fn new(scenario: impl Into<String>, host: HostIdentity, targets: Vec<Target>) -> Self {
        let database = default_database(&host.hostname);
        Self {
            scenario: scenario.into(),
            interval: get_default_interval(),
            probe_timeout: get_default_probe_timeout(),
            targets,
            host,
            database,
            max_ticks: None,
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval(self.interval));
        }

        if self.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(self.probe_timeout));
        }

        if self.max_ticks == Some(0) {
            return Err(ConfigError::InvalidTickLimit);
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(ConfigError::EmptyTargetName);
            }
            if !seen.insert(target.name.as_str()) {
                return Err(ConfigError::DuplicateTarget(target.name.clone()));
            }
            if !target.is_probed() {
                warn!("target {} has neither host nor url", target.name);
            }
        }

        if self.probe_timeout >= self.interval {
            warn!(
                "probe timeout ({:?}) is not shorter than the interval ({:?}), ticks may overrun",
                self.probe_timeout, self.interval
            );
        }

        trace!("validated config: {self:?}");
        Ok(self)
    }
}

/// Parse a positive number of seconds (e.g. `"0.8"`) into a [`Duration`].
pub fn parse_seconds(raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(raw.to_string()))?;

    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidInterval(Duration),
    InvalidTimeout(Duration),
    InvalidDuration(String),
    InvalidTickLimit,
    DuplicateTarget(String),
    EmptyTargetName,
    InvalidTarget(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidInterval(d) => write!(f, "interval must be positive, got {d:?}"),
            ConfigError::InvalidTimeout(d) => {
                write!(f, "probe timeout must be positive, got {d:?}")
            }
            ConfigError::InvalidDuration(raw) => write!(f, "invalid number of seconds: {raw}"),
            ConfigError::InvalidTickLimit => write!(f, "tick limit must be at least 1"),
            ConfigError::DuplicateTarget(name) => write!(f, "duplicate target name: {name}"),
            ConfigError::EmptyTargetName => write!(f, "target name must not be empty"),
            ConfigError::InvalidTarget(raw) => write!(
                f,
                "invalid target '{raw}', expected NAME[,host=HOST][,url=URL]"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
