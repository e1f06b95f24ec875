//! DNS providers.
//!
//! Only the generic HTTP `callback` provider is built in: it calls a
//! user-supplied URL with the new address substituted into it.

use std::net::IpAddr;

use reqwest::{Client, StatusCode};

use crate::config::schema::{CallbackConfig, DnsEntry};
use crate::ddns::ip::IpFamily;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unsupported provider {0:?}")]
    Unsupported(String),

    #[error("callback url is empty")]
    MissingUrl,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// A record that needs to point at `ip`.
#[derive(Debug, Clone, Copy)]
pub struct RecordUpdate<'a> {
    pub domain: &'a str,
    pub ip: IpAddr,
    pub family: IpFamily,
    pub ttl: u32,
}

#[derive(Debug, Clone)]
pub enum Provider {
    Callback(CallbackConfig),
}

impl Provider {
    /// Provider configured for `entry`.
    pub fn for_entry(entry: &DnsEntry) -> Result<Self, ProviderError> {
        match entry.provider.as_str() {
            "callback" => {
                if entry.callback.url.trim().is_empty() {
                    return Err(ProviderError::MissingUrl);
                }
                Ok(Provider::Callback(entry.callback.clone()))
            }
            other => Err(ProviderError::Unsupported(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Callback(_) => "callback",
        }
    }

    /// Point one record at the new address.
    pub async fn update(&self, client: &Client, record: &RecordUpdate<'_>) -> Result<(), ProviderError> {
        match self {
            Provider::Callback(callback) => update_callback(client, callback, record).await,
        }
    }
}

async fn update_callback(
    client: &Client,
    callback: &CallbackConfig,
    record: &RecordUpdate<'_>,
) -> Result<(), ProviderError> {
    let url = substitute(&callback.url, record);
    let request = if callback.request_body.trim().is_empty() {
        client.get(&url)
    } else {
        let body = substitute(&callback.request_body, record);
        let content_type = if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
            "application/json"
        } else {
            "application/x-www-form-urlencoded"
        };
        client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
    };

    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status,
        body: body.chars().take(200).collect(),
    })
}

/// Replace `#{ip}`, `#{domain}`, `#{recordType}` and `#{ttl}`.
pub fn substitute(template: &str, record: &RecordUpdate<'_>) -> String {
    let ttl = if record.ttl == 0 {
        String::new()
    } else {
        record.ttl.to_string()
    };
    template
        .replace("#{ip}", &record.ip.to_string())
        .replace("#{domain}", record.domain)
        .replace("#{recordType}", record.family.record_type())
        .replace("#{ttl}", &ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RecordUpdate<'static> {
        RecordUpdate {
            domain: "home.example.com",
            ip: "2001:db8::1".parse().unwrap(),
            family: IpFamily::V6,
            ttl: 600,
        }
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            "https://dyn.example.com/?h=#{domain}&ip=#{ip}&t=#{recordType}&ttl=#{ttl}",
            &record(),
        );
        assert_eq!(
            out,
            "https://dyn.example.com/?h=home.example.com&ip=2001:db8::1&t=AAAA&ttl=600"
        );
    }

    #[test]
    fn test_for_entry() {
        let mut entry = DnsEntry::default();
        assert!(matches!(
            Provider::for_entry(&entry),
            Err(ProviderError::MissingUrl)
        ));

        entry.callback.url = "https://dyn.example.com/?ip=#{ip}".into();
        assert_eq!(Provider::for_entry(&entry).unwrap().name(), "callback");

        entry.provider = "alidns".into();
        assert!(matches!(
            Provider::for_entry(&entry),
            Err(ProviderError::Unsupported(p)) if p == "alidns"
        ));
    }
}
