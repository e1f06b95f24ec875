//! Connectivity gate.
//!
//! # Responsibilities
//! - Block startup until at least one well-known endpoint is reachable
//! - Retry forever with a bounded delay between probes
//!
//! # Design Decisions
//! - No timeout: at boot the network may come up minutes after the agent
//! - No cancellation: the process is reachable or it gets killed
//! - Targets are probed round-robin, one probe per delay

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::net::resolver::{HostResolver, ResolverError};
use crate::observability::{tr, Lang, Message};
use crate::resilience::backoff::calculate_backoff;

/// Endpoints probed before the first update cycle.
pub const DEFAULT_PROBE_TARGETS: &[&str] = &[
    "api.cloudflare.com:443",
    "dnsapi.cn:443",
    "alidns.aliyuncs.com:443",
    "dns.google:443",
];

/// First delay after a failed probe.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for the delay between probes.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid probe target {0:?}")]
    InvalidTarget(String),

    #[error(transparent)]
    Resolve(#[from] ResolverError),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {0} timed out")]
    Timeout(SocketAddr),
}

/// A single reachability check against a `host:port` target.
pub trait Probe: Send + Sync {
    fn probe(&self, target: &str) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Resolves the target and opens a TCP connection to it.
pub struct TcpProbe {
    resolver: HostResolver,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(resolver: HostResolver) -> Self {
        Self {
            resolver,
            timeout: Duration::from_secs(5),
        }
    }
}

impl Probe for TcpProbe {
    async fn probe(&self, target: &str) -> Result<(), ProbeError> {
        let (host, port) = target
            .rsplit_once(':')
            .and_then(|(h, p)| Some((h, p.parse::<u16>().ok()?)))
            .ok_or_else(|| ProbeError::InvalidTarget(target.to_string()))?;

        let mut last_err = None;
        for ip in self.resolver.lookup(host).await? {
            let addr = SocketAddr::new(ip, port);
            match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(source)) => last_err = Some(ProbeError::Connect { addr, source }),
                Err(_) => last_err = Some(ProbeError::Timeout(addr)),
            }
        }
        Err(last_err.unwrap_or_else(|| ResolverError::Empty(host.to_string()).into()))
    }
}

/// Blocks until network reachability is confirmed.
pub struct ConnectivityGate<P> {
    probe: P,
    targets: Vec<String>,
    base_delay: Duration,
    max_delay: Duration,
    lang: Lang,
}

impl<P: Probe> ConnectivityGate<P> {
    pub fn new<I, S>(probe: P, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            probe,
            targets: targets.into_iter().map(Into::into).collect(),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            lang: Lang::default(),
        }
    }

    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max.max(base);
        self
    }

    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Probe targets until one succeeds. Returns the number of probes made.
    pub async fn wait(&self) -> u64 {
        if self.targets.is_empty() {
            tracing::warn!("No connectivity targets configured, not waiting for network");
            return 0;
        }

        let mut probes = 0u64;
        let mut failures = 0u32;
        loop {
            for target in &self.targets {
                probes += 1;
                match self.probe.probe(target).await {
                    Ok(()) => {
                        if failures > 0 {
                            tracing::info!(
                                endpoint = %target,
                                probes,
                                "{}",
                                tr(self.lang, Message::NetworkConnected)
                            );
                        } else {
                            tracing::debug!(endpoint = %target, "Network reachable");
                        }
                        return probes;
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        let delay = calculate_backoff(failures, self.base_delay, self.max_delay);
                        tracing::warn!(
                            endpoint = %target,
                            error = %e,
                            retry_in = ?delay,
                            "{}",
                            tr(self.lang, Message::WaitingForNetwork)
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
