//! Webhook notification after records were pushed.

use std::net::IpAddr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;

use crate::config::schema::WebhookConfig;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook url is empty")]
    Disabled,

    #[error("invalid header line {0:?}")]
    InvalidHeader(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Outcome for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateStatus {
    Updated,
    Unchanged,
    Failed,
}

impl UpdateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStatus::Updated => "Updated",
            UpdateStatus::Unchanged => "Unchanged",
            UpdateStatus::Failed => "Failed",
        }
    }
}

/// What happened to the records of one entry during a cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Notification {
    pub ipv4_addr: Option<IpAddr>,
    pub ipv4_domains: Vec<(String, UpdateStatus)>,
    pub ipv6_addr: Option<IpAddr>,
    pub ipv6_domains: Vec<(String, UpdateStatus)>,
}

impl Notification {
    /// Whether anything was pushed or failed.
    pub fn should_notify(&self) -> bool {
        self.ipv4_domains
            .iter()
            .chain(&self.ipv6_domains)
            .any(|(_, s)| *s != UpdateStatus::Unchanged)
    }

    /// Sample used by the web interface's test button.
    pub fn sample() -> Self {
        Self {
            ipv4_addr: "192.0.2.1".parse().ok(),
            ipv4_domains: vec![("ipv4.example.com".into(), UpdateStatus::Updated)],
            ipv6_addr: "2001:db8::1".parse().ok(),
            ipv6_domains: vec![("ipv6.example.com".into(), UpdateStatus::Failed)],
        }
    }

    /// Replace the `#{...}` placeholders in `template`.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("#{ipv4Addr}", &addr(self.ipv4_addr))
            .replace("#{ipv4Domains}", &domains(&self.ipv4_domains))
            .replace("#{ipv4Result}", summary(&self.ipv4_domains))
            .replace("#{ipv6Addr}", &addr(self.ipv6_addr))
            .replace("#{ipv6Domains}", &domains(&self.ipv6_domains))
            .replace("#{ipv6Result}", summary(&self.ipv6_domains))
    }
}

fn addr(ip: Option<IpAddr>) -> String {
    ip.map(|ip| ip.to_string()).unwrap_or_default()
}

fn domains(list: &[(String, UpdateStatus)]) -> String {
    list.iter()
        .map(|(d, _)| d.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn summary(list: &[(String, UpdateStatus)]) -> &'static str {
    if list.is_empty() {
        ""
    } else if list.iter().any(|(_, s)| *s == UpdateStatus::Failed) {
        UpdateStatus::Failed.as_str()
    } else if list.iter().any(|(_, s)| *s == UpdateStatus::Updated) {
        UpdateStatus::Updated.as_str()
    } else {
        UpdateStatus::Unchanged.as_str()
    }
}

/// Parse `Key: Value` lines.
pub fn parse_headers(lines: &[String]) -> Result<HeaderMap, WebhookError> {
    let mut headers = HeaderMap::new();
    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        let invalid = || WebhookError::InvalidHeader(line.to_string());
        let (name, value) = line.split_once(':').ok_or_else(invalid)?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Deliver a notification. Returns the status line and response body.
pub async fn send(
    client: &Client,
    webhook: &WebhookConfig,
    notification: &Notification,
) -> Result<String, WebhookError> {
    if !webhook.is_enabled() {
        return Err(WebhookError::Disabled);
    }

    let url = notification.render(webhook.url.trim());
    let headers = parse_headers(&webhook.headers)?;

    let request = if webhook.request_body.trim().is_empty() {
        client.get(&url)
    } else {
        let body = notification.render(&webhook.request_body);
        let content_type = if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        };
        client.post(&url).header(CONTENT_TYPE, content_type).body(body)
    };

    let response = request.headers(headers).send().await?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::info!(url = %url, status = %status, "Webhook delivered");
    Ok(format!("{} {}", status, body))
}
