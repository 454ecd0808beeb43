//! Authentication API endpoints
//!
//! Handles HTTP requests for the browser session:
//! - POST /api/auth/login - Exchange credentials for a session cookie
//! - GET /api/auth/me - Current user, or `null` without a session
//! - POST /api/auth/me - Update the current user's profile
//! - POST /api/auth/logout - Clear the session cookie

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{json_body, ApiError, AppState, MaybeSession, SessionToken};
use crate::models::{ProfileUpdate, User};

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response carrying the current user; `user` is `null` without a session
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Option<User>,
}

/// Response for a profile update
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub ok: serde_json::Value,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(get_current_user).post(update_profile))
        .route("/logout", post(logout))
}

/// POST /api/auth/login - User login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = json_body(payload)?;
    let grant = state.session_service.login(&body.email, &body.password).await?;

    let cookie = state
        .session_cookie
        .issue(&grant.jwt)
        .ok_or_else(|| ApiError::new("INTERNAL_ERROR", "Session token is not a valid cookie value"))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    Ok((headers, Json(UserResponse { user: Some(grant.user) })))
}

/// GET /api/auth/me - Get current user
///
/// No session yields `{ "user": null }`; a session the CMS refuses is a 401.
async fn get_current_user(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<UserResponse>, ApiError> {
    let token = session.as_ref().map(|s| s.0.as_str());
    let user = state.session_service.current_user(token).await?;
    Ok(Json(UserResponse { user }))
}

/// POST /api/auth/me - Update current user's profile
async fn update_profile(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let body = json_body(payload)?;
    let ok = state.session_service.update_profile(&token, &body).await?;
    Ok(Json(ProfileResponse { ok }))
}

/// POST /api/auth/logout - User logout
///
/// Only the cookie is cleared; the CMS token stays valid until it expires.
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = state.session_cookie.clear() {
        headers.insert(header::SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, headers)
}
