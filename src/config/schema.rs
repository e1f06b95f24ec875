//! Persisted configuration schema.
//!
//! This module defines the structure of the configuration file edited through
//! the web interface. All types derive Serde traits for TOML and JSON.

use serde::{Deserialize, Serialize};

/// Current layout version written by [`crate::config::migrate`].
pub const SCHEMA_VERSION: u32 = 2;

/// Root of the persisted configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DdnsConfig {
    /// Layout version; absent (0) in files written before versioning.
    #[serde(default)]
    pub schema_version: u32,

    /// Web login name.
    pub username: String,

    /// Web login password hash (see [`crate::config::password`]).
    pub password: String,

    /// Reject web requests from public addresses.
    pub not_allow_wan_access: bool,

    /// Locale for operator-facing messages (`en`, `zh`).
    pub lang: String,

    /// Legacy single-entry layout: provider name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_provider: Option<String>,

    /// Notification sent after records changed.
    pub webhook: WebhookConfig,

    /// Records to keep updated.
    pub dns: Vec<DnsEntry>,

    /// Legacy single-entry layout: IPv4 source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpSource>,

    /// Legacy single-entry layout: IPv6 source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpSource>,
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            username: String::new(),
            password: String::new(),
            not_allow_wan_access: true,
            lang: "en".to_string(),
            webhook: WebhookConfig::default(),
            dns: Vec::new(),
            dns_provider: None,
            ipv4: None,
            ipv6: None,
        }
    }
}

impl DdnsConfig {
    /// Whether web credentials have been set.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Copy safe to hand to the browser.
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

/// One DNS provider account and the records it manages.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DnsEntry {
    /// Display name, also used as the IP cache key.
    pub name: String,

    /// Provider identifier.
    pub provider: String,

    /// Record TTL in seconds; 0 leaves the provider default.
    pub ttl: u32,

    pub ipv4: IpSource,

    pub ipv6: IpSource,

    /// Settings for the `callback` provider.
    pub callback: CallbackConfig,
}

impl Default for DnsEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: "callback".to_string(),
            ipv4: IpSource::default(),
            ipv6: IpSource::default(),
            ttl: 0,
            callback: CallbackConfig::default(),
        }
    }
}

/// Where to learn the public address of one family and which records use it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct IpSource {
    pub enable: bool,

    /// Endpoints queried in order; the body must contain the address.
    #[serde(alias = "url", deserialize_with = "string_or_list")]
    pub urls: Vec<String>,

    /// Fully qualified record names.
    #[serde(deserialize_with = "string_or_list")]
    pub domains: Vec<String>,
}

/// Generic HTTP provider.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct CallbackConfig {
    /// Target URL; placeholders are substituted.
    pub url: String,

    /// POST body; empty means GET.
    pub request_body: String,
}

/// Notification endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,

    /// POST body; empty means GET.
    pub request_body: String,

    /// `Key: Value` lines.
    #[serde(deserialize_with = "string_or_list")]
    pub headers: Vec<String>,
}

impl WebhookConfig {
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Older files stored lists as a single newline or comma separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(s) => s
            .split(['\n', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Raw::Many(v) => v,
    })
}
