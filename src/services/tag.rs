//! Tag service
//!
//! Lists CMS tags and resolves the labels the frontend submits to tag ids.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cms::{CmsApi, CmsError, TagQuery};
use crate::models::{Collection, Tag};

/// Tag service for listing and label resolution
pub struct TagService {
    cms: Arc<dyn CmsApi>,
}

impl TagService {
    pub fn new(cms: Arc<dyn CmsApi>) -> Self {
        Self { cms }
    }

    /// Tags for the browser: first page of 100, sorted by label
    pub async fn list(&self, token: &str) -> Result<Collection<Tag>, CmsError> {
        self.cms.list_tags(token, &TagQuery::listing()).await
    }

    /// Resolve labels to tag ids, case-insensitively.
    ///
    /// No CMS call is made when `labels` is empty.
    pub async fn resolve_labels(&self, token: &str, labels: &[String]) -> Result<Vec<i64>, CmsError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let tags = self.cms.list_tags(token, &TagQuery::lookup()).await?;
        let ids = resolve_tag_ids(&tags.data, labels);
        if ids.len() < labels.len() {
            tracing::debug!(
                requested = labels.len(),
                resolved = ids.len(),
                "Dropped unknown tag labels"
            );
        }
        Ok(ids)
    }
}

/// Map labels to ids of matching tags, ignoring case.
///
/// Unknown labels are dropped. When two tags share a label ignoring case the
/// later one wins.
pub fn resolve_tag_ids(tags: &[Tag], labels: &[String]) -> Vec<i64> {
    let by_label: HashMap<String, i64> = tags
        .iter()
        .map(|tag| (tag.label.to_lowercase(), tag.id))
        .collect();

    labels
        .iter()
        .filter_map(|label| by_label.get(&label.to_lowercase()).copied())
        .collect()
}
