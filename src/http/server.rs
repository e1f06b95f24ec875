//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, authentication gates)
//! - Bind the listening socket
//! - Serve until an unrecoverable error

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ConfigStore, RuntimeContext};
use crate::http::auth::{public_gate, session_gate, SessionStore};
use crate::http::{assets, handlers};
use crate::observability::{Lang, LogBuffer};

/// Request timeout for web handlers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<RuntimeContext>,
    pub store: Arc<ConfigStore>,
    pub sessions: Arc<SessionStore>,
    pub logs: LogBuffer,
    pub client: reqwest::Client,
    pub lang: Lang,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        context: Arc<RuntimeContext>,
        store: Arc<ConfigStore>,
        logs: LogBuffer,
        client: reqwest::Client,
        lang: Lang,
    ) -> Self {
        Self {
            context,
            store,
            sessions: Arc::new(SessionStore::default()),
            logs,
            client,
            lang,
            started_at: Instant::now(),
        }
    }
}

/// Error type for the web service lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server stopped unexpectedly")]
    Stopped,
}

/// HTTP server for the configuration interface.
pub struct WebServer {
    router: Router,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let public = Router::new()
            .route("/static/{*path}", get(assets::static_file))
            .route("/favicon.ico", get(assets::favicon))
            .route("/login", get(handlers::login_page))
            .route("/loginFunc", post(handlers::login_func))
            .route_layer(middleware::from_fn_with_state(state.clone(), public_gate));

        let private = Router::new()
            .route("/", get(handlers::index))
            .route("/save", post(handlers::save))
            .route("/logs", get(handlers::logs))
            .route("/clearLog", get(handlers::clear_log).post(handlers::clear_log))
            .route("/webhookTest", post(handlers::webhook_test))
            .route("/logout", get(handlers::logout))
            .route_layer(middleware::from_fn_with_state(state.clone(), session_gate));

        public
            .merge(private)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                REQUEST_TIMEOUT,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Router for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the listening socket.
    ///
    /// The IPv6 wildcard falls back to `0.0.0.0` on hosts without IPv6.
    pub async fn bind(addr: SocketAddr) -> Result<TcpListener, WebError> {
        match TcpListener::bind(addr).await {
            Ok(listener) => Ok(listener),
            Err(source)
                if addr.is_ipv6()
                    && addr.ip().is_unspecified()
                    && source.kind() != std::io::ErrorKind::AddrInUse =>
            {
                let fallback = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), addr.port());
                tracing::warn!(%addr, error = %source, "IPv6 wildcard unavailable, binding {fallback}");
                TcpListener::bind(fallback)
                    .await
                    .map_err(|source| WebError::Bind { addr: fallback, source })
            }
            Err(source) => Err(WebError::Bind { addr, source }),
        }
    }

    /// Serve connections. Only returns on failure.
    pub async fn serve(self, listener: TcpListener) -> WebError {
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        match axum::serve(listener, app).await {
            Ok(()) => WebError::Stopped,
            Err(e) => WebError::Serve(e),
        }
    }
}
