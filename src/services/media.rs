//! Media relay
//!
//! Streams images from the CMS media origin through this server so the
//! browser never talks to the media host directly. Only URLs under the
//! configured origin are fetched.

use std::sync::Arc;

use crate::cms::{CmsApi, CmsError, MediaStream};
use crate::models::Media;

/// Content type used when the origin does not send one
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Error types for media relay operations
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("URL parameter required")]
    MissingUrl,

    #[error("Invalid image source")]
    InvalidSource,

    #[error(transparent)]
    Upstream(#[from] CmsError),
}

pub struct MediaRelay {
    cms: Arc<dyn CmsApi>,
    origin: String,
}

impl MediaRelay {
    /// `origin` must end with `/`; see `CmsConfig::media_origin`
    pub fn new(cms: Arc<dyn CmsApi>, origin: impl Into<String>) -> Self {
        Self {
            cms,
            origin: origin.into(),
        }
    }

    /// Validate a requested URL against the media origin
    pub fn check_source<'a>(&self, url: Option<&'a str>) -> Result<&'a str, MediaError> {
        let url = url.map(str::trim).filter(|u| !u.is_empty()).ok_or(MediaError::MissingUrl)?;
        if !is_allowed_source(&self.origin, url) {
            tracing::warn!(url = %url, "Rejected media URL outside the media origin");
            return Err(MediaError::InvalidSource);
        }
        Ok(url)
    }

    /// Fetch a media file after validating its URL
    pub async fn fetch(&self, url: Option<&str>) -> Result<MediaStream, MediaError> {
        let url = self.check_source(url)?;
        self.cms.fetch_media(url).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Media fetch failed");
            MediaError::Upstream(e)
        })
    }

    /// Relay URL for a media path
    pub fn proxy_url(&self, path: &str) -> String {
        proxy_url(&self.origin, path)
    }

    /// Set `proxyUrl` on a media reference
    pub fn present_media(&self, mut media: Media) -> Media {
        media.proxy_url = Some(self.proxy_url(&media.url));
        media
    }
}

/// Whether `url` lies under `origin`.
///
/// `origin` ends with `/`, so a plain prefix test also rules out host
/// extensions such as `http://host:1337.evil.com/`.
pub fn is_allowed_source(origin: &str, url: &str) -> bool {
    origin.ends_with('/') && url.starts_with(origin)
}

/// Build `/api/proxy-image?url=...` for a media path or absolute URL
pub fn proxy_url(origin: &str, path: &str) -> String {
    let absolute = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", origin, path.trim_start_matches('/'))
    };
    format!("/api/proxy-image?url={}", urlencoding::encode(&absolute))
}
