//! Supervision of the web configuration service.
//!
//! The web service runs on its own task. It never stops the update loop by
//! itself: any failure is logged, the supervisor waits out a grace period so
//! the operator can read the message (and pending cycles can finish), then
//! asks the main task to exit with code 1.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::http::{AppState, WebError, WebServer};
use crate::lifecycle::Shutdown;
use crate::observability::{tr, Lang, Message};

/// Time between a web failure and process exit.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Marker file present inside Docker containers.
const DOCKER_ENV_FILE: &str = "/.dockerenv";

/// Observable state of the web service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting,
    Listening(SocketAddr),
    Failed,
}

pub struct WebSupervisor {
    listen: SocketAddr,
    state: AppState,
    grace: Duration,
    first_run_hint: bool,
    status: watch::Sender<ServiceState>,
}

impl WebSupervisor {
    pub fn new(listen: SocketAddr, state: AppState) -> Self {
        let (status, _) = watch::channel(ServiceState::Starting);
        Self {
            listen,
            state,
            grace: DEFAULT_GRACE_PERIOD,
            first_run_hint: true,
            status,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Skip opening a browser when no configuration exists yet.
    pub fn without_first_run_hint(mut self) -> Self {
        self.first_run_hint = false;
        self
    }

    /// Follow the service state.
    pub fn status(&self) -> watch::Receiver<ServiceState> {
        self.status.subscribe()
    }

    /// Start the supervisor task.
    pub fn spawn(self, shutdown: Shutdown) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: Shutdown) {
        let lang = self.state.lang;
        let error = self.serve().await;
        self.status.send_replace(ServiceState::Failed);

        let message = match error {
            WebError::Bind { .. } => Message::BindFailed,
            _ => Message::WebServiceFailed,
        };
        tracing::error!(
            address = %self.listen,
            error = %error,
            exit_in = ?self.grace,
            "{}",
            tr(lang, message)
        );

        tokio::time::sleep(self.grace).await;
        shutdown.trigger(1);
    }

    async fn serve(&self) -> WebError {
        let listener = match WebServer::bind(self.listen).await {
            Ok(listener) => listener,
            Err(e) => return e,
        };
        let local = listener.local_addr().unwrap_or(self.listen);
        self.status.send_replace(ServiceState::Listening(local));
        tracing::info!(address = %local, "{}", tr(self.state.lang, Message::Listening));

        if self.first_run_hint && !self.state.store.exists() {
            announce_first_run(local, self.state.lang);
        }

        WebServer::new(self.state.clone()).serve(listener).await
    }
}

/// Point a new user at the configuration page. Best effort.
fn announce_first_run(addr: SocketAddr, lang: Lang) {
    if Path::new(DOCKER_ENV_FILE).exists() {
        tracing::info!(port = addr.port(), "{}", tr(lang, Message::DockerHint));
        return;
    }

    let url = browser_url(addr);
    tokio::task::spawn_blocking(move || {
        if let Err(e) = open::that(&url) {
            tracing::debug!(url = %url, error = %e, "Could not open browser");
        }
    });
}

/// URL a local browser should open for a listener bound to `addr`.
pub fn browser_url(addr: SocketAddr) -> String {
    if is_global_unicast(addr.ip()) {
        format!("http://{}", addr)
    } else {
        format!("http://127.0.0.1:{}", addr.port())
    }
}

fn is_global_unicast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified()
                || v4.is_loopback()
                || v4.is_multicast()
                || v4.is_link_local()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
            !(v6.is_unspecified() || v6.is_loopback() || v6.is_multicast() || link_local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_url() {
        assert_eq!(browser_url("0.0.0.0:9876".parse().unwrap()), "http://127.0.0.1:9876");
        assert_eq!(browser_url("[::]:9876".parse().unwrap()), "http://127.0.0.1:9876");
        assert_eq!(browser_url("127.0.0.1:8080".parse().unwrap()), "http://127.0.0.1:8080");
        assert_eq!(
            browser_url("192.168.1.5:9876".parse().unwrap()),
            "http://192.168.1.5:9876"
        );
        assert_eq!(
            browser_url("[2001:db8::5]:9876".parse().unwrap()),
            "http://[2001:db8::5]:9876"
        );
    }
}
