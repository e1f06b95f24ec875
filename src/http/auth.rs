//! Authentication gates and session storage.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use dashmap::DashMap;

use crate::http::server::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "ddns_session";

/// How long a login stays valid.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// In-memory session tokens with expiry.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Instant>,
}

impl SessionStore {
    /// Create a session and return its token.
    pub fn create(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), Instant::now() + SESSION_TTL);
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        let now = Instant::now();
        self.sessions.retain(|_, expires| *expires > now);
        self.sessions.contains_key(token)
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE,
        token,
        SESSION_TTL.as_secs()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE)
}

/// Session token from the `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Loopback, private, link-local and unique-local addresses.
pub fn is_lan(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_lan(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Rejects public peers when the configuration forbids WAN access.
///
/// Requests without peer information (in-process calls) count as local.
fn wan_rejection(state: &AppState, request: &Request) -> Option<Response> {
    if !state.store.current().not_allow_wan_access {
        return None;
    }
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())?;
    if is_lan(peer) {
        return None;
    }
    tracing::warn!(peer = %peer, path = %request.uri().path(), "Rejected request from public address");
    Some((StatusCode::FORBIDDEN, "access from public networks is disabled").into_response())
}

/// Gate for login and static routes.
pub async fn public_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(rejection) = wan_rejection(&state, &request) {
        return rejection;
    }
    next.run(request).await
}

/// Gate for routes that need a logged-in session.
pub async fn session_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(rejection) = wan_rejection(&state, &request) {
        return rejection;
    }

    match session_token(request.headers()) {
        Some(token) if state.sessions.is_valid(&token) => next.run(request).await,
        _ => Redirect::to("/login").into_response(),
    }
}
