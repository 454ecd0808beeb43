//! Static file serving for the built frontend
//!
//! Files are read from the configured directory. Unknown paths fall back to
//! `index.html` so client-side routing can take over.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::api::middleware::{cache_control_static, AppState};

/// Serve a frontend file, or `index.html` for client-side routes
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let decoded = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let root = &state.config.server.static_dir;

    if let Some(file) = resolve(root, &decoded) {
        if let Ok(contents) = fs::read(&file).await {
            return build_response(&decoded, contents);
        }
    }

    match fs::read(root.join("index.html")).await {
        Ok(contents) => build_response("index.html", contents),
        Err(e) => {
            tracing::debug!(dir = %root.display(), error = %e, "Frontend index not found");
            not_found()
        }
    }
}

/// Map a request path to a file under `root`; `None` for directories or
/// paths escaping the root
fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

/// Build HTTP response with proper headers
fn build_response(path: &str, data: Vec<u8>) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if is_immutable(path) {
        cache_control_static(31536000, true)
    } else if content_type.starts_with("text/html") {
        "no-cache".to_string()
    } else {
        cache_control_static(3600, false)
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, cache_control),
        ],
        Body::from(data),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body><h1>404 Not Found</h1></body></html>",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Hashed build output that never changes under the same name
fn is_immutable(path: &str) -> bool {
    (path.contains("/_nuxt/") || path.contains("/assets/"))
        && (path.ends_with(".js") || path.ends_with(".css"))
}
