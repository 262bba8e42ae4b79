//! Selection of skill-like entities by category

use crate::ner::sanitize::RawEntity;
use std::collections::HashSet;

/// Field carrying the aggregated entity category
pub const CATEGORY_FIELD: &str = "entity_group";

/// Keeps only entities whose category is in an allow-list
#[derive(Debug, Clone)]
pub struct SkillFilter {
    allowed_labels: HashSet<String>,
}

impl Default for SkillFilter {
    fn default() -> Self {
        Self::new(["MISC"])
    }
}

impl SkillFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, entity: &RawEntity) -> bool {
        entity
            .get(CATEGORY_FIELD)
            .and_then(|v| v.as_str())
            .map_or(false, |label| self.allowed_labels.contains(label))
    }

    /// Ordered subsequence of `entities` with an allowed category. Records with
    /// no category (or a non-string one) are dropped.
    pub fn filter(&self, entities: Vec<RawEntity>) -> Vec<RawEntity> {
        entities.into_iter().filter(|e| self.allows(e)).collect()
    }
}
