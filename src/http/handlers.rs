use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::config::password::{hash_password, verify_password};
use crate::config::schema::{DdnsConfig, WebhookConfig};
use crate::config::{migrate, validation::validate_config};
use crate::ddns::{webhook, Notification};
use crate::http::auth::{expired_cookie, session_cookie, session_token};
use crate::http::pages;
use crate::http::server::AppState;

/// Credentials may only be chosen this long after startup.
pub const FIRST_LOGIN_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub code: u16,
    pub msg: String,
}

impl ApiResponse {
    fn reply(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                msg: msg.into(),
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(State(state): State<AppState>) -> Html<String> {
    let first_time = !state.store.current().has_credentials();
    Html(pages::login(first_time, &state.context.version))
}

pub async fn login_func(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let config = state.store.current();

    if config.has_credentials() {
        if form.username != config.username || !verify_password(&form.password, &config.password) {
            tracing::warn!(username = %form.username, "Login failed");
            return ApiResponse::reply(StatusCode::UNAUTHORIZED, "invalid username or password")
                .into_response();
        }
        return start_session(&state);
    }

    // First start: whoever arrives inside the window chooses the credentials.
    if state.started_at.elapsed() > FIRST_LOGIN_WINDOW {
        return ApiResponse::reply(
            StatusCode::FORBIDDEN,
            "credentials must be set within 5 minutes of startup; restart the agent",
        )
        .into_response();
    }
    if form.username.trim().is_empty() || form.password.is_empty() {
        return ApiResponse::reply(StatusCode::BAD_REQUEST, "username and password are required")
            .into_response();
    }

    let mut updated = (*config).clone();
    updated.username = form.username.trim().to_string();
    updated.password = hash_password(&form.password);
    if let Err(e) = state.store.save(updated) {
        tracing::error!(error = %e, "Failed to store credentials");
        return ApiResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    tracing::info!(username = %form.username.trim(), "Web credentials created");
    start_session(&state)
}

fn start_session(state: &AppState) -> Response {
    let token = state.sessions.create();
    ([(header::SET_COOKIE, session_cookie(&token))], Redirect::to("/")).into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(&token);
    }
    ([(header::SET_COOKIE, expired_cookie())], Redirect::to("/login")).into_response()
}

pub async fn index(State(state): State<AppState>) -> Response {
    let config = state.store.current().redacted();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => Html(pages::index(&json, &state.context.version)).into_response(),
        Err(e) => {
            ApiResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Accept a full configuration from the browser.
///
/// Blank credentials keep the stored ones. The document is normalized and
/// validated before it replaces the file.
pub async fn save(
    State(state): State<AppState>,
    Json(mut incoming): Json<DdnsConfig>,
) -> (StatusCode, Json<ApiResponse>) {
    let current = state.store.current();

    if incoming.username.trim().is_empty() {
        incoming.username = current.username.clone();
    }
    incoming.password = if incoming.password.is_empty() {
        current.password.clone()
    } else {
        hash_password(&incoming.password)
    };

    migrate::normalize(&mut incoming);
    if let Err(errors) = validate_config(&incoming) {
        let msg = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return ApiResponse::reply(StatusCode::BAD_REQUEST, msg);
    }

    match state.store.save(incoming) {
        Ok(()) => {
            tracing::info!(path = %state.store.path().display(), "Configuration saved");
            ApiResponse::reply(StatusCode::OK, "ok")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save configuration");
            ApiResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn logs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.logs.lines())
}

pub async fn clear_log(State(state): State<AppState>) -> StatusCode {
    state.logs.clear();
    StatusCode::NO_CONTENT
}

pub async fn webhook_test(
    State(state): State<AppState>,
    Json(webhook): Json<WebhookConfig>,
) -> (StatusCode, Json<ApiResponse>) {
    match webhook::send(&state.client, &webhook, &Notification::sample()).await {
        Ok(outcome) => ApiResponse::reply(StatusCode::OK, outcome),
        Err(e) => ApiResponse::reply(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
