//! HTTP GET probe

use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace};

use super::{HttpOutcome, ProbeFailure};
use crate::util::round_ms;

/// HTTP prober with a client reused across requests
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` and time it until the response headers arrive
    ///
    /// The body is never read. Every HTTP status, 4xx and 5xx included, is a
    /// successful probe.
    #[instrument(skip(self))]
    pub async fn get(&self, url: &str, timeout: Duration) -> HttpOutcome {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => HttpOutcome::Responded {
                latency_ms: round_ms(start.elapsed()),
                status: response.status().as_u16(),
            },
            Ok(Err(e)) if e.is_timeout() => HttpOutcome::Failed(ProbeFailure::Timeout),
            Ok(Err(e)) => HttpOutcome::Failed(ProbeFailure::Request(e.to_string())),
            Err(_) => HttpOutcome::Failed(ProbeFailure::Timeout),
        };

        match &outcome {
            HttpOutcome::Failed(failure) => debug!("GET {url}: {failure}"),
            _ => trace!("GET {url}: {outcome:?}"),
        }

        outcome
    }
}
