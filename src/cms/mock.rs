//! In-memory CMS used by service and router tests

use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{CmsApi, CmsError, MediaStream, Populate, TagQuery, UploadFile};
use crate::models::{
    AuthGrant, AuthorRef, Collection, Course, CourseInput, Lesson, LessonInput, Media,
    ProfileUpdate, Tag, User,
};

struct Account {
    email: String,
    password: String,
    token: String,
    user: User,
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Account>,
    courses: HashMap<String, Course>,
    lessons: HashMap<String, Lesson>,
    tags: Vec<Tag>,
    media: HashMap<String, (String, Vec<u8>)>,
    created_courses: Vec<CourseInput>,
    uploads: Vec<UploadFile>,
    calls: Vec<String>,
    fail_lesson_creates: bool,
    empty_uploads: bool,
    next_id: i64,
}

/// Fake CMS keeping documents in memory and logging every call
#[derive(Default)]
pub struct MockCms {
    state: Mutex<MockState>,
}

pub fn user(id: i64, document_id: &str, email: &str) -> User {
    User {
        id,
        document_id: Some(document_id.to_string()),
        username: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        confirmed: true,
        blocked: false,
        created_at: None,
        updated_at: None,
    }
}

pub fn course(document_id: &str, authors: &[&User]) -> Course {
    Course {
        id: 1,
        document_id: document_id.to_string(),
        title: format!("Course {}", document_id),
        description: Some("About".to_string()),
        cover: None,
        tags: Vec::new(),
        authors: authors
            .iter()
            .map(|u| AuthorRef {
                id: Some(u.id),
                document_id: u.document_id.clone(),
                username: Some(u.username.clone()),
            })
            .collect(),
        lessons: Some(Vec::new()),
        created_at: None,
        updated_at: None,
    }
}

pub fn lesson(document_id: &str, content: &str) -> Lesson {
    Lesson {
        id: None,
        document_id: document_id.to_string(),
        title: format!("Lesson {}", document_id),
        content: Some(content.to_string()),
        video_url: None,
        created_at: None,
        updated_at: None,
    }
}

impl MockCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, token: &str, user: User) -> Self {
        self.lock().accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            token: token.to_string(),
            user,
        });
        self
    }

    pub fn with_course(self, course: Course) -> Self {
        self.lock().courses.insert(course.document_id.clone(), course);
        self
    }

    pub fn with_lesson(self, lesson: Lesson) -> Self {
        self.lock().lessons.insert(lesson.document_id.clone(), lesson);
        self
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.lock().tags = tags;
        self
    }

    pub fn with_media(self, url: &str, content_type: &str, data: &[u8]) -> Self {
        self.lock()
            .media
            .insert(url.to_string(), (content_type.to_string(), data.to_vec()));
        self
    }

    /// Make every lesson creation fail with a 500
    pub fn failing_lesson_creates(self) -> Self {
        self.lock().fail_lesson_creates = true;
        self
    }

    /// Make `/upload` accept files but return an empty list
    pub fn empty_uploads(self) -> Self {
        self.lock().empty_uploads = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn course(&self, id: &str) -> Option<Course> {
        self.lock().courses.get(id).cloned()
    }

    pub fn lesson(&self, id: &str) -> Option<Lesson> {
        self.lock().lessons.get(id).cloned()
    }

    pub fn created_courses(&self) -> Vec<CourseInput> {
        self.lock().created_courses.clone()
    }

    pub fn uploads(&self) -> Vec<UploadFile> {
        self.lock().uploads.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MockState {
    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn user_for(&self, token: &str) -> Result<User, CmsError> {
        self.accounts
            .iter()
            .find(|a| a.token == token)
            .map(|a| a.user.clone())
            .ok_or_else(|| CmsError::status(401, "Missing or invalid credentials"))
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[async_trait]
impl CmsApi for MockCms {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, CmsError> {
        let mut state = self.lock();
        state.record("POST /auth/local".to_string());
        state
            .accounts
            .iter()
            .find(|a| a.email == identifier && a.password == password)
            .map(|a| AuthGrant {
                jwt: a.token.clone(),
                user: a.user.clone(),
            })
            .ok_or_else(|| CmsError::status(400, "Invalid identifier or password"))
    }

    async fn current_user(&self, token: &str) -> Result<User, CmsError> {
        let mut state = self.lock();
        state.record("GET /users/me".to_string());
        state.user_for(token)
    }

    async fn update_current_user(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, CmsError> {
        let mut state = self.lock();
        state.record("POST /users/me".to_string());
        let user = state.user_for(token)?;
        Ok(serde_json::json!({
            "id": user.id,
            "username": update.username,
            "email": update.email,
        }))
    }

    async fn list_courses(&self, token: &str, populate: Populate) -> Result<Collection<Course>, CmsError> {
        let mut state = self.lock();
        state.record(format!("GET /courses {:?}", populate));
        state.user_for(token)?;
        let mut courses: Vec<Course> = state.courses.values().cloned().collect();
        courses.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(Collection::new(courses))
    }

    async fn get_course(
        &self,
        token: &str,
        id: &str,
        populate: Populate,
    ) -> Result<Option<Course>, CmsError> {
        let mut state = self.lock();
        state.record(format!("GET /courses/{} {:?}", id, populate));
        state.user_for(token)?;
        Ok(state.courses.get(id).cloned())
    }

    async fn create_course(&self, token: &str, input: &CourseInput) -> Result<Course, CmsError> {
        let mut state = self.lock();
        state.record("POST /courses".to_string());
        state.user_for(token)?;

        let id = state.next_id();
        let tags = state
            .tags
            .iter()
            .filter(|t| input.tags.contains(&t.id))
            .cloned()
            .collect();
        let course = Course {
            id,
            document_id: format!("course-{}", id),
            title: input.title.clone(),
            description: Some(input.description.clone()),
            cover: None,
            tags,
            authors: input
                .authors
                .iter()
                .map(|a| AuthorRef { id: Some(*a), ..Default::default() })
                .collect(),
            lessons: None,
            created_at: None,
            updated_at: None,
        };
        state.created_courses.push(input.clone());
        state.courses.insert(course.document_id.clone(), course.clone());
        Ok(course)
    }

    async fn set_course_lessons(
        &self,
        token: &str,
        id: &str,
        lesson_ids: &[String],
    ) -> Result<Course, CmsError> {
        let mut state = self.lock();
        state.record(format!("PUT /courses/{}", id));
        state.user_for(token)?;

        let lessons: Vec<Lesson> = lesson_ids
            .iter()
            .filter_map(|lid| state.lessons.get(lid).cloned())
            .collect();
        let course = state
            .courses
            .get_mut(id)
            .ok_or_else(|| CmsError::status(404, "Not Found"))?;
        course.lessons = Some(lessons);
        Ok(course.clone())
    }

    async fn create_lesson(&self, token: &str, input: &LessonInput) -> Result<Lesson, CmsError> {
        let mut state = self.lock();
        state.record("POST /lessons".to_string());
        state.user_for(token)?;
        if state.fail_lesson_creates {
            return Err(CmsError::status(500, "Internal Server Error"));
        }

        let id = state.next_id();
        let created = Lesson {
            id: Some(id),
            document_id: format!("lesson-{}", id),
            title: input.title.clone(),
            content: Some(input.content.clone()),
            video_url: None,
            created_at: Some(input.published_at),
            updated_at: Some(input.published_at),
        };
        state.lessons.insert(created.document_id.clone(), created.clone());
        Ok(created)
    }

    async fn update_lesson(
        &self,
        token: &str,
        id: &str,
        input: &LessonInput,
    ) -> Result<Lesson, CmsError> {
        let mut state = self.lock();
        state.record(format!("PUT /lessons/{}", id));
        state.user_for(token)?;

        let lesson = state
            .lessons
            .get_mut(id)
            .ok_or_else(|| CmsError::status(404, "Not Found"))?;
        lesson.title = input.title.clone();
        lesson.content = Some(input.content.clone());
        lesson.updated_at = Some(input.published_at);
        Ok(lesson.clone())
    }

    async fn list_tags(&self, token: &str, query: &TagQuery) -> Result<Collection<Tag>, CmsError> {
        let mut state = self.lock();
        state.record("GET /tags".to_string());
        state.user_for(token)?;

        let mut tags = state.tags.clone();
        if query.sort.as_deref() == Some("label:asc") {
            tags.sort_by(|a, b| a.label.cmp(&b.label));
        }
        tags.truncate(query.page_size as usize);
        Ok(Collection::new(tags))
    }

    async fn upload(&self, token: &str, file: UploadFile) -> Result<Vec<Media>, CmsError> {
        let mut state = self.lock();
        state.record("POST /upload".to_string());
        state.user_for(token)?;

        if state.empty_uploads {
            state.uploads.push(file);
            return Ok(Vec::new());
        }

        let id = state.next_id();
        let media = Media {
            id,
            document_id: None,
            url: format!("/uploads/{}", file.file_name),
            name: Some(file.file_name.clone()),
            mime: file.content_type.clone(),
            proxy_url: None,
        };
        state.uploads.push(file);
        Ok(vec![media])
    }

    async fn fetch_media(&self, url: &str) -> Result<MediaStream, CmsError> {
        let mut state = self.lock();
        state.record(format!("GET {}", url));

        let (content_type, data) = state
            .media
            .get(url)
            .cloned()
            .ok_or_else(|| CmsError::status(404, "Image fetch failed: Not Found"))?;
        let content_length = Some(data.len() as u64);
        let body = futures::stream::once(async move { Ok::<_, CmsError>(Bytes::from(data)) }).boxed();

        Ok(MediaStream {
            content_type: Some(content_type),
            content_length,
            body,
        })
    }
}
