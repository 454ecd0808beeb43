//! Tag model
//!
//! Tags label courses. The CMS owns them; the frontend refers to them by
//! their human-readable label and the proxy resolves labels to ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity as stored in the CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Numeric identifier, used when linking tags to courses
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Human-readable label
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tag {
    /// Create a tag with only the fields the proxy cares about.
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            document_id: None,
            label: label.into(),
            created_at: None,
            updated_at: None,
        }
    }
}
