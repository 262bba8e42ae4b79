//! Report produced by a full analysis run

use crate::ner::sanitize::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Skill entities found in the resume
    pub skills: Vec<Entity>,

    /// Skill entities found in the job description
    pub job_skills: Vec<Entity>,

    /// Cosine similarity of the two texts' embeddings
    pub similarity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancies: Option<String>,

    /// Which generation backend answered, when generation ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Resume skills that also appear among the job's skills
    pub fn shared_skills(&self) -> Vec<&str> {
        let job: HashSet<String> = self.job_skills.iter().map(|e| e.text.to_lowercase()).collect();
        distinct(&self.skills, |key| job.contains(key))
    }

    /// Job skills with no match among the resume's skills
    pub fn missing_skills(&self) -> Vec<&str> {
        let resume: HashSet<String> = self.skills.iter().map(|e| e.text.to_lowercase()).collect();
        distinct(&self.job_skills, |key| !resume.contains(key))
    }
}

/// Entity texts passing `keep`, first spelling wins; matching is case-insensitive
fn distinct<'a>(entities: &'a [Entity], keep: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|e| {
            let key = e.text.to_lowercase();
            keep(&key) && seen.insert(key)
        })
        .map(|e| e.text.as_str())
        .collect()
}
