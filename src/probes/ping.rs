//! ICMP echo probe
//!
//! Sockets are opened lazily, once per address family, and reused for every
//! later ping. On Linux `surge-ping` uses unprivileged datagram ICMP sockets,
//! which need `net.ipv4.ping_group_range` to include the running group; when
//! the socket cannot be opened the probe reports [`ProbeFailure::Socket`] and
//! retries on the next call.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, trace};

use super::{PingOutcome, ProbeFailure};
use crate::util::round_ms;

const PAYLOAD: [u8; 32] = [0; 32];

pub struct IcmpPinger {
    v4: OnceCell<Client>,
    v6: OnceCell<Client>,
    sequence: AtomicU16,
}

impl IcmpPinger {
    pub fn new() -> Self {
        Self {
            v4: OnceCell::new(),
            v6: OnceCell::new(),
            sequence: AtomicU16::new(0),
        }
    }

    /// Ping `host` once, giving up after `timeout`
    #[instrument(skip(self))]
    pub async fn ping(&self, host: &str, timeout: Duration) -> PingOutcome {
        let outcome = match tokio::time::timeout(timeout, self.echo(host, timeout)).await {
            Ok(Ok(rtt)) => PingOutcome::Replied {
                latency_ms: round_ms(rtt),
            },
            Ok(Err(failure)) => PingOutcome::Failed(failure),
            Err(_) => PingOutcome::Failed(ProbeFailure::Timeout),
        };

        match &outcome {
            PingOutcome::Failed(failure) => debug!("ping {host}: {failure}"),
            _ => trace!("ping {host}: {outcome:?}"),
        }

        outcome
    }

    async fn echo(&self, host: &str, timeout: Duration) -> Result<Duration, ProbeFailure> {
        let addr = resolve(host).await?;
        let client = self.client_for(addr).await?;

        // identifier and sequence together keep concurrent pings apart
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let identifier = (std::process::id() as u16).wrapping_add(sequence);

        let mut pinger = client.pinger(addr, PingIdentifier(identifier)).await;
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(sequence), &PAYLOAD).await {
            Ok((_packet, rtt)) => Ok(rtt),
            Err(SurgeError::Timeout { .. }) => Err(ProbeFailure::Timeout),
            Err(e) => Err(ProbeFailure::Socket(e.to_string())),
        }
    }

    async fn client_for(&self, addr: IpAddr) -> Result<&Client, ProbeFailure> {
        let (cell, kind) = match addr {
            IpAddr::V4(_) => (&self.v4, ICMP::V4),
            IpAddr::V6(_) => (&self.v6, ICMP::V6),
        };

        let config = Config::builder().kind(kind).build();

        cell.get_or_try_init(|| async { Client::new(&config) })
            .await
            .map_err(|e| ProbeFailure::Socket(e.to_string()))
    }
}

impl Default for IcmpPinger {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve an IP literal or host name to the first address returned.
pub async fn resolve(host: &str) -> Result<IpAddr, ProbeFailure> {
    if let Ok(addr) = host.parse::<IpAddr>() {
        return Ok(addr);
    }

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| ProbeFailure::Resolve(e.to_string()))?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeFailure::Resolve(format!("no addresses for {host}")))
}
