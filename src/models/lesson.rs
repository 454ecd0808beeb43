//! Lesson model
//!
//! A lesson's optional video URL is not a CMS field: it travels inside
//! `content` as an HTML comment marker (see `services::lesson`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lesson entity as stored in the CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Video URL extracted from the content marker; never read from the CMS
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lesson as submitted by the frontend when editing a course.
///
/// `document_id` is either a persisted CMS id or a client-generated
/// placeholder for a lesson that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Body sent to the CMS when creating or updating a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
}
