//! Session service
//!
//! Exchanges credentials for a CMS token and resolves tokens back to users.
//! The token itself is kept by the browser in a signed cookie; this service
//! only talks to the CMS.

use std::sync::Arc;

use crate::cms::{CmsApi, CmsError};
use crate::models::{AuthGrant, ProfileUpdate, User};

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The CMS refused the identifier/password pair
    #[error("Invalid identifier or password")]
    InvalidCredentials,

    /// The CMS no longer accepts the session token
    #[error("Session rejected by the CMS")]
    Rejected,

    #[error(transparent)]
    Upstream(#[from] CmsError),
}

/// Session service backed by the CMS auth endpoints
pub struct SessionService {
    cms: Arc<dyn CmsApi>,
}

impl SessionService {
    pub fn new(cms: Arc<dyn CmsApi>) -> Self {
        Self { cms }
    }

    /// Log in with an email (or username) and password.
    ///
    /// # Errors
    /// - `Validation` if either field is blank
    /// - `InvalidCredentials` if the CMS rejects the pair with a 4xx
    /// - `Upstream` on transport or server failures
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, SessionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        match self.cms.login(identifier, password).await {
            Ok(grant) => {
                tracing::info!(user_id = grant.user.id, "User logged in");
                Ok(grant)
            }
            Err(e) if e.is_client_error() => {
                tracing::info!(error = %e, "Login rejected by CMS");
                Err(SessionError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!(error = %e, "Login request failed");
                Err(e.into())
            }
        }
    }

    /// Resolve the current user.
    ///
    /// `Ok(None)` means there is no session at all; a token the CMS refuses
    /// is `Rejected`.
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<User>, SessionError> {
        let Some(token) = token else {
            return Ok(None);
        };

        match self.cms.current_user(token).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Err(SessionError::Rejected),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch current user");
                Err(e.into())
            }
        }
    }

    /// Update the current user's profile and return the CMS response body
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, SessionError> {
        self.cms.update_current_user(token, update).await.map_err(|e| {
            tracing::warn!(error = %e, "Profile update failed");
            SessionError::Upstream(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::mock::{self, MockCms};

    fn service() -> SessionService {
        let cms = MockCms::new().with_account(
            "ada@example.com",
            "secret",
            "jwt-ada",
            mock::user(7, "u7", "ada@example.com"),
        );
        SessionService::new(Arc::new(cms))
    }

    #[tokio::test]
    async fn test_login_success() {
        let grant = service().login("ada@example.com", "secret").await.unwrap();
        assert_eq!(grant.jwt, "jwt-ada");
        assert_eq!(grant.user.id, 7);
    }

    #[tokio::test]
    async fn test_login_trims_identifier() {
        let grant = service().login("  ada@example.com ", "secret").await.unwrap();
        assert_eq!(grant.user.id, 7);
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let svc = service();
        assert!(matches!(svc.login("", "secret").await, Err(SessionError::Validation(_))));
        assert!(matches!(svc.login("ada@example.com", "").await, Err(SessionError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let result = service().login("ada@example.com", "nope").await;
        assert!(matches!(result, Err(SessionError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_current_user_without_token() {
        assert!(service().current_user(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user_with_token() {
        let user = service().current_user(Some("jwt-ada")).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some(7));
    }

    #[tokio::test]
    async fn test_current_user_rejected_token() {
        let result = service().current_user(Some("jwt-stale")).await;
        assert!(matches!(result, Err(SessionError::Rejected)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let update = ProfileUpdate {
            username: "ada2".to_string(),
            email: "ada@example.com".to_string(),
            tags: Vec::new(),
        };
        let body = service().update_profile("jwt-ada", &update).await.unwrap();
        assert_eq!(body["username"], "ada2");
    }

    #[tokio::test]
    async fn test_update_profile_rejected() {
        let result = service()
            .update_profile("jwt-stale", &ProfileUpdate::default())
            .await;
        assert!(matches!(result, Err(SessionError::Upstream(e)) if e.status_code() == Some(401)));
    }
}
