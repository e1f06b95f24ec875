//! Outbound HTTP client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::RuntimeContext;
use crate::net::resolver::HostResolver;

/// Per-request timeout for IP discovery, provider and webhook calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the client used by the update cycle and the web interface.
pub fn build_client(ctx: &RuntimeContext, resolver: &HostResolver) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(format!("ddns-agent/{}", ctx.version))
        .danger_accept_invalid_certs(ctx.skip_verify)
        .dns_resolver(Arc::new(resolver.clone()))
        .build()
}
