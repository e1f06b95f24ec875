//! Host name resolution.
//!
//! # Responsibilities
//! - Honor a custom DNS server for every lookup when one is configured
//! - Otherwise use the system resolver, falling back to backup DNS servers
//! - Serve as the resolver of outbound HTTP clients
//!
//! # Design Decisions
//! - hickory resolvers are built on first use, inside the runtime
//! - Backup servers are write-once; they depend on the configured locale

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::observability::Lang;

/// Backup servers for Chinese-language deployments.
const BACKUP_DNS_ZH: [Ipv4Addr; 3] = [
    Ipv4Addr::new(223, 5, 5, 5),
    Ipv4Addr::new(114, 114, 114, 114),
    Ipv4Addr::new(119, 29, 29, 29),
];

/// Backup servers otherwise.
const BACKUP_DNS_DEFAULT: [Ipv4Addr; 3] = [
    Ipv4Addr::new(1, 1, 1, 1),
    Ipv4Addr::new(8, 8, 8, 8),
    Ipv4Addr::new(9, 9, 9, 9),
];

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("invalid DNS server address {0:?}")]
    InvalidServer(String),

    #[error("lookup of {host} failed: {message}")]
    Lookup { host: String, message: String },

    #[error("{0} resolved to no addresses")]
    Empty(String),
}

/// Resolver shared by the connectivity gate and all HTTP clients.
#[derive(Clone)]
pub struct HostResolver {
    inner: Arc<Inner>,
}

struct Inner {
    custom: Option<Vec<SocketAddr>>,
    custom_resolver: OnceLock<TokioAsyncResolver>,
    backup: OnceLock<Vec<SocketAddr>>,
    backup_resolver: OnceLock<TokioAsyncResolver>,
}

impl HostResolver {
    /// Build a resolver, validating the optional custom server (`ip` or `ip:port`).
    pub fn new(custom_dns: Option<&str>) -> Result<Self, ResolverError> {
        let custom = custom_dns.map(parse_dns_server).transpose()?.map(|s| vec![s]);
        Ok(Self {
            inner: Arc::new(Inner {
                custom,
                custom_resolver: OnceLock::new(),
                backup: OnceLock::new(),
                backup_resolver: OnceLock::new(),
            }),
        })
    }

    /// Install backup servers: the custom server if set, otherwise a list for `lang`.
    ///
    /// Only the first call has an effect.
    pub fn init_backup(&self, lang: Lang) {
        let servers = match &self.inner.custom {
            Some(custom) => custom.clone(),
            None => {
                let list = match lang {
                    Lang::Zh => BACKUP_DNS_ZH,
                    Lang::En => BACKUP_DNS_DEFAULT,
                };
                list.iter()
                    .map(|ip| SocketAddr::new(IpAddr::V4(*ip), 53))
                    .collect()
            }
        };
        if self.inner.backup.set(servers).is_err() {
            tracing::debug!("Backup DNS already initialized");
        }
    }

    /// Installed backup servers, if any.
    pub fn backup_servers(&self) -> Option<&[SocketAddr]> {
        self.inner.backup.get().map(Vec::as_slice)
    }

    pub fn custom_server(&self) -> Option<SocketAddr> {
        self.inner.custom.as_ref().and_then(|c| c.first().copied())
    }

    /// Resolve `host` to IP addresses.
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolverError> {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        if let Some(servers) = &self.inner.custom {
            let resolver = self
                .inner
                .custom_resolver
                .get_or_init(|| build_resolver(servers));
            return hickory_lookup(resolver, host).await;
        }

        match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => {
                let ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
                if ips.is_empty() {
                    return Err(ResolverError::Empty(host.to_string()));
                }
                Ok(ips)
            }
            Err(e) => {
                let Some(servers) = self.inner.backup.get() else {
                    return Err(ResolverError::Lookup {
                        host: host.to_string(),
                        message: e.to_string(),
                    });
                };
                tracing::debug!(host, error = %e, "System DNS failed, using backup DNS");
                let resolver = self
                    .inner
                    .backup_resolver
                    .get_or_init(|| build_resolver(servers));
                hickory_lookup(resolver, host).await
            }
        }
    }
}

impl reqwest::dns::Resolve for HostResolver {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let this = self.clone();
        Box::pin(async move {
            let ips = this.lookup(name.as_str()).await?;
            let addrs: reqwest::dns::Addrs =
                Box::new(ips.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

/// Parse `ip` or `ip:port`; port defaults to 53.
pub fn parse_dns_server(input: &str) -> Result<SocketAddr, ResolverError> {
    let input = input.trim();
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    input
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ResolverError::InvalidServer(input.to_string()))
}

fn build_resolver(servers: &[SocketAddr]) -> TokioAsyncResolver {
    let mut group = NameServerConfigGroup::new();
    for server in servers {
        group.merge(NameServerConfigGroup::from_ips_clear(
            &[server.ip()],
            server.port(),
            true,
        ));
    }
    TokioAsyncResolver::tokio(
        ResolverConfig::from_parts(None, vec![], group),
        ResolverOpts::default(),
    )
}

async fn hickory_lookup(
    resolver: &TokioAsyncResolver,
    host: &str,
) -> Result<Vec<IpAddr>, ResolverError> {
    let ips: Vec<IpAddr> = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| ResolverError::Lookup {
            host: host.to_string(),
            message: e.to_string(),
        })?
        .iter()
        .collect();
    if ips.is_empty() {
        return Err(ResolverError::Empty(host.to_string()));
    }
    Ok(ips)
}
