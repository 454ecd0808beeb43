//! Media relay endpoint
//!
//! - GET /api/proxy-image?url=... - Stream an image from the CMS media origin

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::api::middleware::{cache_control_static, ApiError, AppState};
use crate::services::media::DEFAULT_MEDIA_TYPE;

/// Query parameters for the relay
#[derive(Debug, Deserialize)]
pub struct ProxyImageQuery {
    pub url: Option<String>,
}

/// Build the media router
pub fn router() -> Router<AppState> {
    Router::new().route("/proxy-image", get(proxy_image))
}

/// GET /api/proxy-image - Relay an image
///
/// No session is required; only URLs under the media origin are fetched.
async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyImageQuery>,
) -> Result<Response, ApiError> {
    let media = state.media_relay.fetch(query.url.as_deref()).await?;

    let content_type = media
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_MEDIA_TYPE));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = media.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    if let Ok(cache_control) = HeaderValue::from_str(&cache_control_static(31536000, true)) {
        headers.insert(header::CACHE_CONTROL, cache_control);
    }

    Ok((StatusCode::OK, headers, Body::from_stream(media.body)).into_response())
}
