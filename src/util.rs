use std::path::PathBuf;
use std::time::Duration;

const NETPULSE_DATABASE: &str = "NETPULSE_DATABASE";

pub fn get_database(hostname: &str) -> PathBuf {
    let database_from_env = std::env::var(NETPULSE_DATABASE);
    database_from_env.map_or_else(|_| default_database(hostname), PathBuf::from)
}

/// Database file named after the measuring host, so runs on different hosts
/// never write into the same file.
pub fn default_database(hostname: &str) -> PathBuf {
    PathBuf::from(format!("metrics_{}.db", sanitize_file_component(hostname)))
}

pub fn sanitize_file_component(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        String::from("unknown")
    } else {
        sanitized
    }
}

const NETPULSE_SCENARIO: &str = "NETPULSE_SCENARIO";

const DEFAULT_SCENARIO: &str = "Scenario_Base_NoRules";

pub fn get_scenario() -> String {
    std::env::var(NETPULSE_SCENARIO).unwrap_or_else(|_| DEFAULT_SCENARIO.to_string())
}

pub fn get_default_interval() -> Duration {
    Duration::from_secs(1)
}

pub fn get_default_probe_timeout() -> Duration {
    Duration::from_millis(800)
}

/// Round a duration to milliseconds with two decimals.
pub fn round_ms(duration: Duration) -> f64 {
    round_to(duration.as_secs_f64() * 1000.0, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
