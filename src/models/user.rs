//! User model
//!
//! Mirrors the CMS users-permissions schema. Users are never stored locally;
//! every instance is a transient copy of what the CMS returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile as returned by the CMS `/users/me` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Numeric identifier
    pub id: i64,
    /// Stable document identifier (absent on older CMS versions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether this user is the given author, by numeric id or document id.
    pub fn is_author(&self, author: &AuthorRef) -> bool {
        if author.id == Some(self.id) {
            return true;
        }
        match (&self.document_id, &author.document_id) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

/// Author reference embedded in a course when populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Successful response of the CMS `/auth/local` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant {
    /// Bearer credential issued by the CMS
    pub jwt: String,
    pub user: User,
}

/// Profile fields the frontend may change on the current user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tags: Vec<serde_json::Value>,
}
