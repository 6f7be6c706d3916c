use crate::model::{ParentTag, TagKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Quality `Good`.
    Active,
    Inactive,
}

/// Operator-selected narrowing of the tag listing. Empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub search: String,
    pub kind: Option<TagKind>,
    pub status: Option<StatusFilter>,
}

impl TagFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.kind.is_none() && self.status.is_none()
    }

    pub fn matches(&self, tag: &ParentTag) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || tag.name.to_lowercase().contains(&needle)
            || tag.description.to_lowercase().contains(&needle);

        let matches_kind = self.kind.map_or(true, |kind| tag.kind == kind);

        let matches_status = match self.status {
            None => true,
            Some(StatusFilter::Active) => tag.quality.is_good(),
            Some(StatusFilter::Inactive) => !tag.quality.is_good(),
        };

        matches_search && matches_kind && matches_status
    }

    pub fn apply<'a>(&self, tags: &'a [ParentTag]) -> Vec<&'a ParentTag> {
        tags.iter().filter(|t| self.matches(t)).collect()
    }
}
