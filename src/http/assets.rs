//! Static files compiled into the binary.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

const APP_JS: &str = include_str!("../../assets/static/app.js");
const STYLE_CSS: &str = include_str!("../../assets/static/style.css");
const FAVICON_SVG: &str = include_str!("../../assets/favicon.svg");

/// Look up an embedded file under `/static/`.
pub fn lookup(path: &str) -> Option<(&'static str, &'static str)> {
    match path.trim_start_matches('/') {
        "app.js" => Some(("text/javascript; charset=utf-8", APP_JS)),
        "style.css" => Some(("text/css; charset=utf-8", STYLE_CSS)),
        _ => None,
    }
}

pub async fn static_file(Path(path): Path<String>) -> Response {
    match lookup(&path) {
        Some((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], FAVICON_SVG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(lookup("app.js").is_some());
        assert_eq!(lookup("/style.css").map(|(ct, _)| ct), Some("text/css; charset=utf-8"));
        assert!(lookup("../Cargo.toml").is_none());
    }
}
