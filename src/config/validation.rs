//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve the web listen address before anything else happens
//! - Semantic checks on configuration saved through the web interface
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - `:port` binds the IPv6 wildcard, which also accepts IPv4 peers

use std::net::{IpAddr, Ipv6Addr, SocketAddr, ToSocketAddrs};

use crate::config::schema::DdnsConfig;

/// Listen address could not be turned into a socket address.
#[derive(Debug, thiserror::Error)]
pub enum ListenAddrError {
    #[error("missing port in address {0:?}")]
    MissingPort(String),

    #[error("invalid port in address {0:?}")]
    InvalidPort(String),

    #[error("cannot resolve {addr:?}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0:?} resolved to no addresses")]
    NoAddress(String),
}

/// Parse a `host:port` listen address the way a TCP resolver would.
pub fn parse_listen_address(input: &str) -> Result<SocketAddr, ListenAddrError> {
    let addr = input.trim();

    if let Ok(parsed) = addr.parse::<SocketAddr>() {
        return Ok(parsed);
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| ListenAddrError::MissingPort(input.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| ListenAddrError::InvalidPort(input.to_string()))?;

    if host.is_empty() {
        return Ok(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port));
    }

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenAddrError::Resolve {
            addr: input.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenAddrError::NoAddress(input.to_string()))
}

/// A semantic problem in a saved configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("entry {index}: name is empty")]
    EmptyName { index: usize },

    #[error("entry {name:?}: duplicate name")]
    DuplicateName { name: String },

    #[error("entry {name:?}: callback url is required")]
    MissingCallbackUrl { name: String },

    #[error("entry {name:?}: {family} enabled without domains")]
    NoDomains { name: String, family: &'static str },

    #[error("entry {name:?}: {family} enabled without ip urls")]
    NoIpUrls { name: String, family: &'static str },

    #[error("invalid url {url:?}")]
    InvalidUrl { url: String },

    #[error("unknown language {0:?}")]
    UnknownLanguage(String),
}

/// Validate a configuration before it is accepted from the web interface.
pub fn validate_config(config: &DdnsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    if !matches!(config.lang.as_str(), "en" | "zh") {
        errors.push(ValidationError::UnknownLanguage(config.lang.clone()));
    }

    if config.webhook.is_enabled() {
        check_url(&config.webhook.url, &mut errors);
    }

    for (index, entry) in config.dns.iter().enumerate() {
        if entry.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { index });
            continue;
        }
        if !seen.insert(entry.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                name: entry.name.clone(),
            });
        }

        if entry.provider == "callback" {
            if entry.callback.url.trim().is_empty() {
                errors.push(ValidationError::MissingCallbackUrl {
                    name: entry.name.clone(),
                });
            } else {
                check_url(&entry.callback.url, &mut errors);
            }
        }

        for (family, source) in [("ipv4", &entry.ipv4), ("ipv6", &entry.ipv6)] {
            if !source.enable {
                continue;
            }
            if source.domains.is_empty() {
                errors.push(ValidationError::NoDomains {
                    name: entry.name.clone(),
                    family,
                });
            }
            if source.urls.is_empty() {
                errors.push(ValidationError::NoIpUrls {
                    name: entry.name.clone(),
                    family,
                });
            }
            for u in &source.urls {
                check_url(u, &mut errors);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(raw: &str, errors: &mut Vec<ValidationError>) {
    // Placeholders are not valid URL syntax in every position.
    let probe = raw.replace("#{", "").replace('}', "");
    if url::Url::parse(&probe).is_err() {
        errors.push(ValidationError::InvalidUrl {
            url: raw.to_string(),
        });
    }
}
