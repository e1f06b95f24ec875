//! Compatibility normalization for older configuration files.

use crate::config::schema::{DdnsConfig, DnsEntry, SCHEMA_VERSION};

/// Bring a loaded configuration up to the current layout.
///
/// Returns `true` when anything changed and the file should be rewritten.
pub fn normalize(config: &mut DdnsConfig) -> bool {
    let before = config.clone();

    // Version 1 kept a single provider at the top level.
    let legacy_v4 = config.ipv4.take();
    let legacy_v6 = config.ipv6.take();
    let legacy_provider = config.dns_provider.take();
    if config.dns.is_empty() && (legacy_v4.is_some() || legacy_v6.is_some()) {
        let mut entry = DnsEntry {
            name: "default".to_string(),
            ..DnsEntry::default()
        };
        if let Some(provider) = legacy_provider.filter(|p| !p.is_empty()) {
            entry.provider = provider;
        }
        entry.ipv4 = legacy_v4.unwrap_or_default();
        entry.ipv6 = legacy_v6.unwrap_or_default();
        config.dns.push(entry);
    }

    config.lang = match config.lang.trim() {
        "" => "en".to_string(),
        l if l.starts_with("zh") => "zh".to_string(),
        l if l.starts_with("en") => "en".to_string(),
        l => l.to_string(),
    };

    for (i, entry) in config.dns.iter_mut().enumerate() {
        if entry.name.trim().is_empty() {
            entry.name = format!("entry-{}", i + 1);
        }
        if entry.provider.is_empty() {
            entry.provider = "callback".to_string();
        }
        for source in [&mut entry.ipv4, &mut entry.ipv6] {
            source.urls.retain(|u| !u.trim().is_empty());
            source.domains.retain(|d| !d.trim().is_empty());
        }
    }

    config.schema_version = SCHEMA_VERSION;
    *config != before
}
