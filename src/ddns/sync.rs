//! One synchronization cycle over all configured entries.

use std::sync::Arc;

use reqwest::Client;

use crate::config::schema::{DnsEntry, IpSource};
use crate::config::ConfigStore;
use crate::ddns::ip::{fetch_ip, IpCache, IpFamily};
use crate::ddns::provider::{Provider, RecordUpdate};
use crate::ddns::webhook::{self, Notification, UpdateStatus};
use crate::scheduler::UpdateCycle;

/// The update cycle run by the scheduler.
pub struct DnsSync {
    store: Arc<ConfigStore>,
    client: Client,
    cache: IpCache,
}

impl DnsSync {
    pub fn new(store: Arc<ConfigStore>, client: Client, cache_times: u32) -> Self {
        Self {
            store,
            client,
            cache: IpCache::new(cache_times),
        }
    }

    /// Run one cycle against the current configuration snapshot.
    ///
    /// Returns one notification per entry that has a working provider.
    pub async fn sync_once(&self) -> Vec<(String, Notification)> {
        let config = self.store.current();
        if config.dns.is_empty() {
            tracing::debug!("No DNS entries configured");
            return Vec::new();
        }

        let mut reports = Vec::with_capacity(config.dns.len());
        for entry in &config.dns {
            let provider = match Provider::for_entry(entry) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(entry = %entry.name, error = %e, "Skipping entry");
                    continue;
                }
            };

            let notification = self.sync_entry(entry, &provider).await;

            if notification.should_notify() && config.webhook.is_enabled() {
                match webhook::send(&self.client, &config.webhook, &notification).await {
                    Ok(outcome) => tracing::debug!(entry = %entry.name, outcome = %outcome, "Webhook sent"),
                    Err(e) => tracing::warn!(entry = %entry.name, error = %e, "Webhook failed"),
                }
            }
            reports.push((entry.name.clone(), notification));
        }
        reports
    }

    async fn sync_entry(&self, entry: &DnsEntry, provider: &Provider) -> Notification {
        let mut notification = Notification::default();

        for (family, source) in [(IpFamily::V4, &entry.ipv4), (IpFamily::V6, &entry.ipv6)] {
            if !source.enable {
                continue;
            }
            let (addr, results) = self.sync_family(entry, provider, family, source).await;
            match family {
                IpFamily::V4 => {
                    notification.ipv4_addr = addr;
                    notification.ipv4_domains = results;
                }
                IpFamily::V6 => {
                    notification.ipv6_addr = addr;
                    notification.ipv6_domains = results;
                }
            }
        }
        notification
    }

    async fn sync_family(
        &self,
        entry: &DnsEntry,
        provider: &Provider,
        family: IpFamily,
        source: &IpSource,
    ) -> (Option<std::net::IpAddr>, Vec<(String, UpdateStatus)>) {
        let ip = match fetch_ip(&self.client, &source.urls, family).await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!(entry = %entry.name, %family, error = %e, "Could not determine public address");
                return (None, Vec::new());
            }
        };

        if !self.cache.observe(&entry.name, family, ip) {
            tracing::debug!(entry = %entry.name, %family, ip = %ip, "Address unchanged");
            let unchanged = source
                .domains
                .iter()
                .map(|d| (d.clone(), UpdateStatus::Unchanged))
                .collect();
            return (Some(ip), unchanged);
        }

        let mut results = Vec::with_capacity(source.domains.len());
        let mut failed = false;
        for domain in &source.domains {
            let record = RecordUpdate {
                domain,
                ip,
                family,
                ttl: entry.ttl,
            };
            match provider.update(&self.client, &record).await {
                Ok(()) => {
                    tracing::info!(
                        entry = %entry.name,
                        provider = provider.name(),
                        domain = %domain,
                        ip = %ip,
                        "Record updated"
                    );
                    results.push((domain.clone(), UpdateStatus::Updated));
                }
                Err(e) => {
                    tracing::error!(
                        entry = %entry.name,
                        provider = provider.name(),
                        domain = %domain,
                        error = %e,
                        "Record update failed"
                    );
                    failed = true;
                    results.push((domain.clone(), UpdateStatus::Failed));
                }
            }
        }

        if failed {
            self.cache.invalidate(&entry.name, family);
        }
        (Some(ip), results)
    }
}

impl UpdateCycle for DnsSync {
    async fn run_cycle(&self) {
        let reports = self.sync_once().await;
        tracing::debug!(entries = reports.len(), "Update cycle finished");
    }
}
