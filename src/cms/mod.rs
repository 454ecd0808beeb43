//! CMS backend access
//!
//! Every upstream call goes through the `CmsApi` trait. This module provides:
//! - `CmsApi` trait defining the operations the server needs from the CMS
//! - `HttpCmsClient` implementing the trait over the CMS REST API
//! - Typed projection (`Populate`) and query (`TagQuery`) parameters
//! - `CmsError` describing upstream failures

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpCmsClient;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{
    AuthGrant, Collection, Course, CourseInput, Lesson, LessonInput, Media, ProfileUpdate, Tag,
    User,
};

/// Error types for CMS operations
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    /// The CMS answered with a non-success status
    #[error("CMS responded with {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("CMS request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("Unexpected CMS response: {0}")]
    Decode(String),
}

impl CmsError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Upstream HTTP status, if the CMS answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The CMS refused the bearer credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(400..=499))
    }

    /// Message suitable for the browser
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for CmsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Error body returned by the CMS on failure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CmsErrorBody {
    #[serde(default)]
    pub error: CmsErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CmsErrorDetail {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Relations the CMS should populate in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Populate {
    /// Only the document's own fields
    #[default]
    None,
    /// Every first-level relation
    All,
    /// The named relations
    Fields(&'static [&'static str]),
}

impl Populate {
    /// Render as `populate` query pairs
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Populate::None => Vec::new(),
            Populate::All => vec![("populate", "*".to_string())],
            Populate::Fields(fields) => fields
                .iter()
                .map(|field| ("populate", field.to_string()))
                .collect(),
        }
    }
}

/// Tag listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    pub page_size: u32,
    pub sort: Option<String>,
}

impl TagQuery {
    /// Listing shown to the browser: first 100 tags, A-Z
    pub fn listing() -> Self {
        Self {
            page_size: 100,
            sort: Some("label:asc".to_string()),
        }
    }

    /// Lookup used to resolve labels to ids
    pub fn lookup() -> Self {
        Self {
            page_size: 100,
            sort: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("pagination[pageSize]", self.page_size.to_string())];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}

/// File to send to the CMS media library
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Streamed media body fetched from the media origin
pub struct MediaStream {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, CmsError>>,
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Operations the server performs against the CMS.
///
/// `token` is always the caller's own bearer credential; the server holds no
/// credentials of its own.
#[async_trait]
pub trait CmsApi: Send + Sync {
    /// Exchange credentials for a session token (`POST /auth/local`)
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, CmsError>;

    /// Profile of the token's owner (`GET /users/me`)
    async fn current_user(&self, token: &str) -> Result<User, CmsError>;

    /// Update the token owner's profile (`POST /users/me`)
    async fn update_current_user(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, CmsError>;

    /// List courses (`GET /courses`)
    async fn list_courses(&self, token: &str, populate: Populate) -> Result<Collection<Course>, CmsError>;

    /// Fetch one course; `None` when it does not exist (`GET /courses/{id}`)
    async fn get_course(
        &self,
        token: &str,
        id: &str,
        populate: Populate,
    ) -> Result<Option<Course>, CmsError>;

    /// Create a course (`POST /courses`)
    async fn create_course(&self, token: &str, input: &CourseInput) -> Result<Course, CmsError>;

    /// Replace a course's lesson association (`PUT /courses/{id}`)
    async fn set_course_lessons(
        &self,
        token: &str,
        id: &str,
        lesson_ids: &[String],
    ) -> Result<Course, CmsError>;

    /// Create a lesson (`POST /lessons`)
    async fn create_lesson(&self, token: &str, input: &LessonInput) -> Result<Lesson, CmsError>;

    /// Update a lesson in place (`PUT /lessons/{id}`)
    async fn update_lesson(
        &self,
        token: &str,
        id: &str,
        input: &LessonInput,
    ) -> Result<Lesson, CmsError>;

    /// List tags (`GET /tags`)
    async fn list_tags(&self, token: &str, query: &TagQuery) -> Result<Collection<Tag>, CmsError>;

    /// Upload a file to the media library (`POST /upload`)
    async fn upload(&self, token: &str, file: UploadFile) -> Result<Vec<Media>, CmsError>;

    /// Fetch a media file by absolute URL, without credentials
    async fn fetch_media(&self, url: &str) -> Result<MediaStream, CmsError>;
}
