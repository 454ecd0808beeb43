//! API layer - HTTP handlers and routing
//!
//! This module contains every HTTP endpoint the frontend talks to:
//! - Session endpoints (login, me, logout)
//! - Course and tag endpoints proxied to the CMS
//! - The media relay
//! - Static frontend serving behind the route guard

pub mod auth;
pub mod cookie;
pub mod courses;
pub mod media;
pub mod middleware;
pub mod static_files;
pub mod tags;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use cookie::SessionCookie;
pub use middleware::{ApiError, AppState, MaybeSession, SessionToken};

/// Build the API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Resource routes (need a session)
    let protected_routes = Router::new()
        .nest("/courses", courses::router())
        .nest("/tags", tags::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ));

    Router::new()
        .nest("/auth", auth::router())
        .merge(media::router())
        .merge(protected_routes)
        .fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .fallback(static_files::serve_static)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::route_guard,
                )),
        )
        .with_state(state)
}

/// CORS configuration with cookie credentials for the frontend origin
fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin).allow_credentials(true),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin; cross-origin requests disabled");
            cors
        }
    }
}
