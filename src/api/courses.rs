//! Course API endpoints
//!
//! Handles HTTP requests for courses. Every route requires a session.
//! - GET /api/courses - List courses
//! - POST /api/courses/create - Create a course from a multipart form
//! - GET /api/courses/{id} - Get one course with all relations
//! - PUT /api/courses/{id} - Replace a course's lessons (authors only)

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, SessionToken};
use crate::cms::UploadFile;
use crate::models::{Collection, Course, Envelope};
use crate::services::NewCourse;

/// Upper bound for a create request, cover image included
const CREATE_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Build the course router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route(
            "/create",
            post(create_course).layer(DefaultBodyLimit::max(CREATE_BODY_LIMIT)),
        )
        .route("/{id}", get(get_course).put(update_course))
}

/// GET /api/courses - List courses with cover, tags and authors
async fn list_courses(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<Collection<Course>>, ApiError> {
    let courses = state.course_service.list(&token).await?;
    Ok(Json(courses))
}

/// GET /api/courses/{id} - Get a course
async fn get_course(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Course>>, ApiError> {
    let course = state.course_service.get(&token, &id).await?;
    Ok(Json(Envelope { data: course }))
}

/// PUT /api/courses/{id} - Replace the course's lessons
///
/// The body is taken raw: it is only parsed once ownership is confirmed.
async fn update_course(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Course>, ApiError> {
    let course = state.course_service.update(&token, &id, &body).await?;
    Ok(Json(course))
}

/// POST /api/courses/create - Create a course
///
/// Accepts multipart/form-data with text fields `name`, `description`,
/// `tags` (JSON array of labels) and an optional file field `coverImage`.
async fn create_course(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Course>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::validation_error("No data sent"))?;
    let new = read_course_form(multipart).await?;
    let course = state.course_service.create(&token, new).await?;
    Ok(Json(course))
}

async fn read_course_form(mut multipart: Multipart) -> Result<NewCourse, ApiError> {
    let mut new = NewCourse::default();
    let mut parts = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if parts == 0 {
            ApiError::validation_error("No data sent")
        } else {
            ApiError::validation_error(format!("Failed to read multipart: {}", e))
        }
    })? {
        parts += 1;
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "coverImage" => {
                let file_name = field.file_name().map(str::to_string).filter(|f| !f.is_empty());
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
                if let Some(file_name) = file_name {
                    new.cover = Some(UploadFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            "name" | "description" | "tags" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read field: {}", e)))?;
                match name.as_str() {
                    "name" => new.title = text,
                    "description" => new.description = text,
                    _ => new.tag_labels = parse_tag_labels(&text)?,
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    if parts == 0 {
        return Err(ApiError::validation_error("No data sent"));
    }
    Ok(new)
}

/// Parse the `tags` form field; blank means no tags
fn parse_tag_labels(raw: &str) -> Result<Vec<String>, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|_| ApiError::validation_error("Tags must be a JSON array of labels"))
}
