//! Lesson content service
//!
//! Lessons have no dedicated video field in the CMS. The video URL is stored
//! inside `content` as a trailing HTML comment:
//!
//! ```text
//! Lesson prose...
//!
//! <!-- videoUrl: https://example.com/v.mp4 -->
//! ```
//!
//! Content never carries more than one marker: every existing marker is
//! stripped before a new one is appended.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Lesson, LessonDraft, LessonInput};

/// Prefix of client-generated ids for lessons not yet persisted
pub const PLACEHOLDER_PREFIX: &str = "temp-";

static VIDEO_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*videoUrl:\s*([\s\S]*?)\s*-->").expect("video marker pattern is valid")
});

/// What to do with a submitted lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonAction<'a> {
    /// Placeholder id: create a new lesson
    Create,
    /// Persisted id: update in place
    Update(&'a str),
    /// No id at all
    Skip,
}

impl<'a> LessonAction<'a> {
    pub fn for_draft(draft: &'a LessonDraft) -> Self {
        match draft.document_id.as_deref() {
            None | Some("") => LessonAction::Skip,
            Some(id) if is_placeholder(id) => LessonAction::Create,
            Some(id) => LessonAction::Update(id),
        }
    }
}

/// Whether an id was assigned by the client rather than the CMS
pub fn is_placeholder(document_id: &str) -> bool {
    document_id.starts_with(PLACEHOLDER_PREFIX)
}

/// Remove every video marker and trim surrounding whitespace.
///
/// Removing one marker can splice together the halves of another, so the
/// pass repeats until nothing matches.
pub fn strip_video_markers(content: &str) -> String {
    let mut stripped = content.to_string();
    while VIDEO_MARKER.is_match(&stripped) {
        stripped = VIDEO_MARKER.replace_all(&stripped, "").into_owned();
    }
    stripped.trim().to_string()
}

/// Normalize a video URL for embedding; `None` when blank
fn sanitize_video_url(url: &str) -> Option<String> {
    let mut url = url.trim().to_string();
    while url.contains("-->") {
        url = url.replace("-->", "");
    }
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// Strip existing markers and append one for `video_url` when non-blank
pub fn embed_video_url(content: &str, video_url: Option<&str>) -> String {
    let stripped = strip_video_markers(content);
    match video_url.and_then(sanitize_video_url) {
        Some(url) => format!("{}\n\n<!-- videoUrl: {} -->", stripped, url),
        None => stripped,
    }
}

/// First embedded video URL, if any
pub fn extract_video_url(content: &str) -> Option<String> {
    VIDEO_MARKER
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|url| !url.is_empty())
}

/// Build the CMS body for a submitted lesson
pub fn lesson_input(draft: &LessonDraft, now: DateTime<Utc>) -> LessonInput {
    LessonInput {
        title: draft.title.clone(),
        content: embed_video_url(
            draft.content.as_deref().unwrap_or_default(),
            draft.video_url.as_deref(),
        ),
        published_at: now,
    }
}

/// Expose the embedded video URL on a lesson returned to the browser
pub fn present(mut lesson: Lesson) -> Lesson {
    lesson.video_url = lesson.content.as_deref().and_then(extract_video_url);
    lesson
}
