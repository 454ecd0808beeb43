//! API middleware
//!
//! Contains:
//! - `AppState` shared by every handler
//! - `ApiError`, the JSON error body returned by every endpoint
//! - Session extraction (`SessionToken`, `MaybeSession`)
//! - `require_session` for resource routes and `route_guard` for page navigations

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{request::Parts, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use super::cookie::SessionCookie;
use crate::cms::{CmsApi, CmsError};
use crate::config::Config;
use crate::guard::{GuardDecision, RouteGuard};
use crate::services::{
    CourseService, CourseServiceError, MediaError, MediaRelay, SessionError, SessionService,
    TagService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session_service: Arc<SessionService>,
    pub course_service: Arc<CourseService>,
    pub tag_service: Arc<TagService>,
    pub media_relay: Arc<MediaRelay>,
    pub session_cookie: Arc<SessionCookie>,
    pub route_guard: Arc<RouteGuard>,
}

impl AppState {
    /// Wire every service to one CMS client
    pub fn new(config: Config, cms: Arc<dyn CmsApi>) -> anyhow::Result<Self> {
        let session_cookie = SessionCookie::from_config(&config.session)?;
        let media_relay = Arc::new(MediaRelay::new(cms.clone(), config.cms.media_origin()));
        let tag_service = Arc::new(TagService::new(cms.clone()));
        let course_service = Arc::new(CourseService::new(
            cms.clone(),
            tag_service.clone(),
            media_relay.clone(),
        ));

        Ok(Self {
            session_service: Arc::new(SessionService::new(cms)),
            course_service,
            tag_service,
            media_relay,
            session_cookie: Arc::new(session_cookie),
            route_guard: Arc::new(RouteGuard::from(&config.guard)),
            config: Arc::new(config),
        })
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
    /// Overrides the status derived from `code`
    #[serde(skip)]
    pub status: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Forward a CMS failure with the status the CMS reported (500 if none)
    pub fn upstream(err: &CmsError) -> Self {
        let status = err.status_code().unwrap_or(500);
        let code = match status {
            401 => "UNAUTHORIZED",
            403 => "FORBIDDEN",
            404 => "NOT_FOUND",
            _ => "UPSTREAM_ERROR",
        };
        Self::new(code, err.message()).with_status(status)
    }

    pub fn status_code(&self) -> StatusCode {
        if let Some(status) = self.status.and_then(|s| StatusCode::from_u16(s).ok()) {
            return status;
        }
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<CmsError> for ApiError {
    fn from(e: CmsError) -> Self {
        Self::upstream(&e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(msg) => Self::validation_error(msg),
            SessionError::InvalidCredentials => {
                Self::unauthorized("Invalid identifier or password").with_status(400)
            }
            SessionError::Rejected => Self::unauthorized("Session expired"),
            SessionError::Upstream(e) => Self::upstream(&e),
        }
    }
}

impl From<CourseServiceError> for ApiError {
    fn from(e: CourseServiceError) -> Self {
        match e {
            CourseServiceError::NotFound(_) => Self::not_found("Course not found"),
            CourseServiceError::Forbidden(msg) => Self::forbidden(msg),
            CourseServiceError::Validation(msg) => Self::validation_error(msg),
            CourseServiceError::Upstream(e) => Self::upstream(&e),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::MissingUrl => Self::validation_error("URL parameter required"),
            MediaError::InvalidSource => Self::forbidden("Invalid image source"),
            MediaError::Upstream(CmsError::Status { status, message }) => {
                Self::new("UPSTREAM_ERROR", message).with_status(status)
            }
            MediaError::Upstream(e) => {
                Self::new("UPSTREAM_ERROR", format!("Failed to fetch image: {}", e))
            }
        }
    }
}

/// Unwrap a JSON body, reporting unreadable payloads as validation errors
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e.body_text())))
}

/// Session token carried by a verified cookie
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts.extensions.get::<SessionToken>() {
            return Ok(token.clone());
        }
        state
            .session_cookie
            .read(&parts.headers)
            .map(SessionToken)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// Session token if present; never rejects
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionToken>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(SessionToken::from_request_parts(parts, state).await.ok()))
    }
}

/// Reject requests without a verified session cookie
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = state
        .session_cookie
        .read(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}

/// Redirect page navigations according to the route guard.
///
/// API calls and non-GET requests pass through untouched. The CMS is only
/// asked about the session when the decision depends on it.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let is_navigation = matches!(*request.method(), Method::GET | Method::HEAD);
    if !is_navigation || is_api_path(&path) || !state.route_guard.depends_on_session(&path) {
        return next.run(request).await;
    }

    let has_session = match state.session_cookie.read(request.headers()) {
        Some(token) => match state.session_service.current_user(Some(&token)).await {
            Ok(user) => user.is_some(),
            Err(e) => {
                tracing::debug!(error = %e, "Treating navigation as anonymous");
                false
            }
        },
        None => false,
    };

    match state.route_guard.decide(&path, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(from = %path, to = %to, "Guard redirect");
            Redirect::to(&to).into_response()
        }
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Build Cache-Control header for static assets
pub fn cache_control_static(max_age: u32, immutable: bool) -> String {
    if immutable {
        format!("public, max-age={}, immutable", max_age)
    } else {
        format!("public, max-age={}", max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_from_code() {
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::new("UPSTREAM_ERROR", "x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_status_override() {
        let error = ApiError::new("UPSTREAM_ERROR", "x").with_status(502);
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_status_not_serialized() {
        let json = serde_json::to_value(ApiError::forbidden("no").with_status(403)).unwrap();
        assert_eq!(json, serde_json::json!({"error": {"code": "FORBIDDEN", "message": "no"}}));
    }

    #[test]
    fn test_upstream_forwards_status() {
        let error = ApiError::upstream(&CmsError::status(422, "Title must be unique"));
        assert_eq!(error.error.code, "UPSTREAM_ERROR");
        assert_eq!(error.error.message, "Title must be unique");
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let error = ApiError::upstream(&CmsError::Transport("connection refused".into()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let error = ApiError::upstream(&CmsError::status(401, "Missing or invalid credentials"));
        assert_eq!(error.error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_invalid_credentials_is_bad_request() {
        let error = ApiError::from(SessionError::InvalidCredentials);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error.message, "Invalid identifier or password");
    }

    #[test]
    fn test_media_errors() {
        let missing = ApiError::from(MediaError::MissingUrl);
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.error.message, "URL parameter required");

        let invalid = ApiError::from(MediaError::InvalidSource);
        assert_eq!(invalid.status_code(), StatusCode::FORBIDDEN);

        let upstream = ApiError::from(MediaError::Upstream(CmsError::status(
            404,
            "Image fetch failed: Not Found",
        )));
        assert_eq!(upstream.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(upstream.error.code, "UPSTREAM_ERROR");
    }

    #[test]
    fn test_is_api_path() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/courses"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/home"));
    }

    #[test]
    fn test_cache_control_static() {
        assert_eq!(cache_control_static(31536000, true), "public, max-age=31536000, immutable");
        assert_eq!(cache_control_static(3600, false), "public, max-age=3600");
    }
}
