//! Course model
//!
//! This module provides:
//! - `Course` entity with its populated relations
//! - `Media` file reference used for course covers
//! - `CourseInput` body sent to the CMS when creating a course

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorRef, Lesson, Tag};

/// Course entity as returned by the CMS.
///
/// Relations (`cover`, `tags`, `authors`, `lessons`) are only present when the
/// request asked the CMS to populate them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    /// Stable identifier used in `/courses/{id}` paths
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<Media>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<Lesson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Uploaded media file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Path or absolute URL on the CMS media origin
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Same-origin URL that routes the file through the media relay
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

/// Body sent to the CMS when creating a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub tags: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<i64>,
    pub authors: Vec<i64>,
}
