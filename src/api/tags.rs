//! Tag API endpoints
//!
//! - GET /api/tags - First 100 tags sorted by label (session required)

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, SessionToken};
use crate::models::{Collection, Tag};

/// Build the tag router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_tags))
}

/// GET /api/tags - Get tag list
async fn list_tags(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<Collection<Tag>>, ApiError> {
    let tags = state.tag_service.list(&token).await?;
    Ok(Json(tags))
}
