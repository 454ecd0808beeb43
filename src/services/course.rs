//! Course service
//!
//! Implements course reads and writes on top of the CMS:
//! - Listing and fetching with the right relation projections
//! - Ownership checks before any write
//! - Lesson upsert followed by a wholesale association replace
//! - Course creation with tag resolution and cover upload
//!
//! Nothing here is transactional. A failure halfway through a lesson upsert
//! leaves the lessons written so far in place.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::lesson::{self, LessonAction};
use super::media::MediaRelay;
use super::tag::TagService;
use crate::cms::{CmsApi, CmsError, Populate, UploadFile};
use crate::models::{Collection, Course, CourseInput, LessonDraft, User};

const LIST_PROJECTION: Populate = Populate::Fields(&["cover", "tags", "authors"]);
const OWNERSHIP_PROJECTION: Populate = Populate::Fields(&["authors"]);

/// Error types for course service operations
#[derive(Debug, thiserror::Error)]
pub enum CourseServiceError {
    #[error("Course not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] CmsError),
}

/// Body of a course update: the complete, ordered lesson list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub lessons: Vec<LessonDraft>,
}

/// Input for creating a course
#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub tag_labels: Vec<String>,
    pub cover: Option<UploadFile>,
}

pub struct CourseService {
    cms: Arc<dyn CmsApi>,
    tags: Arc<TagService>,
    media: Arc<MediaRelay>,
}

impl CourseService {
    pub fn new(cms: Arc<dyn CmsApi>, tags: Arc<TagService>, media: Arc<MediaRelay>) -> Self {
        Self { cms, tags, media }
    }

    /// List courses with cover, tags and authors
    pub async fn list(&self, token: &str) -> Result<Collection<Course>, CourseServiceError> {
        let mut courses = self.cms.list_courses(token, LIST_PROJECTION).await?;
        courses.data = courses.data.into_iter().map(|c| self.present(c)).collect();
        Ok(courses)
    }

    /// Fetch one course with every relation populated
    pub async fn get(&self, token: &str, id: &str) -> Result<Course, CourseServiceError> {
        self.cms
            .get_course(token, id, Populate::All)
            .await?
            .map(|c| self.present(c))
            .ok_or_else(|| CourseServiceError::NotFound(id.to_string()))
    }

    /// Check that the token's owner is an author of the course.
    ///
    /// The user and the course are fetched concurrently.
    pub async fn authorize(&self, token: &str, id: &str) -> Result<(User, Course), CourseServiceError> {
        let (user, course) = tokio::try_join!(
            self.cms.current_user(token),
            self.cms.get_course(token, id, OWNERSHIP_PROJECTION),
        )?;

        let course = course.ok_or_else(|| CourseServiceError::NotFound(id.to_string()))?;
        if !course.authors.iter().any(|author| user.is_author(author)) {
            tracing::warn!(user_id = user.id, course_id = %id, "Course update by non-author");
            return Err(CourseServiceError::Forbidden(
                "You do not own this course".to_string(),
            ));
        }

        Ok((user, course))
    }

    /// Replace a course's lessons with the ones in `body`.
    ///
    /// Ownership is checked before `body` is parsed, so a non-author is
    /// refused whatever they send.
    pub async fn update(&self, token: &str, id: &str, body: &[u8]) -> Result<Course, CourseServiceError> {
        self.authorize(token, id).await?;

        let request: UpdateCourseRequest = serde_json::from_slice(body)
            .map_err(|e| CourseServiceError::Validation(format!("Invalid course body: {}", e)))?;

        let lesson_ids = self.upsert_lessons(token, &request.lessons).await?;
        let course = self.cms.set_course_lessons(token, id, &lesson_ids).await?;

        tracing::info!(course_id = %id, lessons = lesson_ids.len(), "Course lessons replaced");
        Ok(self.present(course))
    }

    /// Create or update each lesson in order and return the persisted ids
    async fn upsert_lessons(
        &self,
        token: &str,
        drafts: &[LessonDraft],
    ) -> Result<Vec<String>, CourseServiceError> {
        let now = Utc::now();
        let mut ids = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let input = lesson::lesson_input(draft, now);
            match LessonAction::for_draft(draft) {
                LessonAction::Create => {
                    let created = self.cms.create_lesson(token, &input).await?;
                    ids.push(created.document_id);
                }
                LessonAction::Update(lesson_id) => {
                    self.cms.update_lesson(token, lesson_id, &input).await?;
                    ids.push(lesson_id.to_string());
                }
                LessonAction::Skip => {
                    tracing::warn!(title = %draft.title, "Skipping lesson without an id");
                }
            }
        }

        Ok(ids)
    }

    /// Create a course authored by the token's owner
    pub async fn create(&self, token: &str, new: NewCourse) -> Result<Course, CourseServiceError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(CourseServiceError::Validation(
                "Course name is required".to_string(),
            ));
        }

        let author = self.cms.current_user(token).await?;
        let tag_ids = self.tags.resolve_labels(token, &new.tag_labels).await?;

        let cover = match new.cover {
            Some(file) => {
                let uploaded = self.cms.upload(token, file).await?;
                let cover = uploaded.first().map(|media| media.id);
                if cover.is_none() {
                    tracing::warn!("Upload returned no files; creating course without a cover");
                }
                cover
            }
            None => None,
        };

        let input = CourseInput {
            title: title.to_string(),
            description: new.description,
            tags: tag_ids,
            cover,
            authors: vec![author.id],
        };
        let course = self.cms.create_course(token, &input).await?;

        tracing::info!(course_id = %course.document_id, author_id = author.id, "Course created");
        Ok(self.present(course))
    }

    /// Fill the derived fields the browser relies on
    fn present(&self, mut course: Course) -> Course {
        course.cover = course.cover.take().map(|cover| self.media.present_media(cover));
        course.lessons = course
            .lessons
            .take()
            .map(|lessons| lessons.into_iter().map(lesson::present).collect());
        course
    }
}
