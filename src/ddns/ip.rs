//! Public address discovery and the unchanged-address cache.

use std::fmt;
use std::net::IpAddr;

use dashmap::DashMap;
use reqwest::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn record_type(self) -> &'static str {
        match self {
            IpFamily::V4 => "A",
            IpFamily::V6 => "AAAA",
        }
    }

    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            IpFamily::V4 => ip.is_ipv4(),
            IpFamily::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IpFamily::V4 => "ipv4",
            IpFamily::V6 => "ipv6",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IpError {
    #[error("no {0} source urls configured")]
    NoSources(IpFamily),

    #[error("no {family} address found ({tried} urls tried)")]
    NotFound { family: IpFamily, tried: usize },
}

/// First address of `family` in a response body.
pub fn extract_ip(body: &str, family: IpFamily) -> Option<IpAddr> {
    body.split(|c: char| !(c.is_ascii_hexdigit() || c == '.' || c == ':'))
        .map(|token| token.trim_matches(|c| c == '.' || c == ':'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<IpAddr>().ok())
        .find(|ip| family.matches(ip))
}

/// Query `urls` in order until one returns an address of `family`.
pub async fn fetch_ip(client: &Client, urls: &[String], family: IpFamily) -> Result<IpAddr, IpError> {
    if urls.is_empty() {
        return Err(IpError::NoSources(family));
    }

    for url in urls {
        let body = match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to read IP response");
                    continue;
                }
            },
            Ok(resp) => {
                tracing::warn!(url = %url, status = %resp.status(), "IP endpoint returned error status");
                continue;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "IP endpoint unreachable");
                continue;
            }
        };

        if let Some(ip) = extract_ip(&body, family) {
            tracing::debug!(url = %url, ip = %ip, "Public address discovered");
            return Ok(ip);
        }
        tracing::warn!(url = %url, %family, "No address in response");
    }

    Err(IpError::NotFound {
        family,
        tried: urls.len(),
    })
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    addr: IpAddr,
    remaining: u32,
}

/// Decides whether an observed address needs to be pushed.
///
/// After a push the next `cache_times` unchanged observations are skipped.
pub struct IpCache {
    entries: DashMap<(String, IpFamily), CacheEntry>,
    cache_times: u32,
}

impl IpCache {
    pub fn new(cache_times: u32) -> Self {
        Self {
            entries: DashMap::new(),
            cache_times,
        }
    }

    /// Record an observation; `true` means the records should be pushed.
    pub fn observe(&self, key: &str, family: IpFamily, addr: IpAddr) -> bool {
        let mut entry = self
            .entries
            .entry((key.to_string(), family))
            .or_insert(CacheEntry {
                addr,
                remaining: 0,
            });

        if entry.addr != addr || entry.remaining == 0 {
            entry.addr = addr;
            entry.remaining = self.cache_times;
            return true;
        }

        entry.remaining -= 1;
        false
    }

    /// Forget an entry so the next observation is pushed.
    pub fn invalidate(&self, key: &str, family: IpFamily) {
        self.entries.remove(&(key.to_string(), family));
    }
}
