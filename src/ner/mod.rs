//! Skill extraction: entity recognition, category filtering, sanitization

pub mod filter;
pub mod grouping;
pub mod recognizer;
pub mod sanitize;

use crate::error::{Result, InsightError};
use filter::SkillFilter;
use log::{debug, info};
use recognizer::EntityRecognizer;
use sanitize::Entity;

/// Recognizer, filter and sanitizer composed into one extraction step
pub struct SkillExtractor {
    recognizer: Box<dyn EntityRecognizer>,
    filter: SkillFilter,
}

impl SkillExtractor {
    pub fn new(recognizer: Box<dyn EntityRecognizer>, filter: SkillFilter) -> Self {
        Self { recognizer, filter }
    }

    pub fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        debug!("Extracting skills from text (length: {})", text.len());

        let raw_entities = self.recognizer.recognize(text).map_err(|e| match e {
            InsightError::EntityInference(msg) => InsightError::EntityInference(msg),
            other => InsightError::EntityInference(other.to_string()),
        })?;
        debug!("Found {} raw entities", raw_entities.len());

        let filtered = self.filter.filter(raw_entities);
        debug!("After filtering: {} entities", filtered.len());

        let skills: Vec<Entity> = filtered.iter().map(Entity::from).collect();
        info!("Extracted {} skills from text", skills.len());
        Ok(skills)
    }
}
