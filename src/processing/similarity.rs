//! Cosine similarity between two texts over a pluggable embedder

use crate::error::{Result, InsightError};
use crate::processing::embeddings::Embedder;
use log::{debug, error, info};

pub struct SimilarityScorer {
    embedder: Box<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Cosine similarity of the two texts' embeddings
    pub fn score(&self, resume_text: &str, job_text: &str) -> Result<f64> {
        if resume_text.trim().is_empty() || job_text.trim().is_empty() {
            return Err(InsightError::InputValidation(
                "both texts must be non-empty to compute similarity".to_string(),
            ));
        }

        debug!("Computing similarity between resume and job description");
        let resume_vec = self.embed(resume_text)?;
        let job_vec = self.embed(job_text)?;

        let similarity = cosine_similarity(&resume_vec, &job_vec)?;
        info!("Computed similarity score: {:.3}", similarity);
        Ok(similarity)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text).map_err(|e| {
            error!("Error in embedding backend: {}", e);
            match e {
                InsightError::SimilarityComputation(msg) => InsightError::SimilarityComputation(msg),
                other => InsightError::SimilarityComputation(other.to_string()),
            }
        })
    }
}

/// dot(a, b) / (|a| * |b|), accumulated in f64
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        error!("Embedding failed: one or both texts returned empty vectors");
        return Err(InsightError::Embedding(
            "one or both texts returned empty vectors".to_string(),
        ));
    }

    if a.len() != b.len() {
        return Err(InsightError::Embedding(format!(
            "embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0, 0.0, 0.0), |(dot, na, nb), (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (dot + x * y, na + x * x, nb + y * y)
    });

    let norm_product = norm_a.sqrt() * norm_b.sqrt();
    if norm_product == 0.0 {
        error!("Cannot compute similarity with zero-vector embeddings");
        return Err(InsightError::DegenerateVector(format!(
            "norms were {} and {}",
            norm_a.sqrt(),
            norm_b.sqrt()
        )));
    }

    Ok(dot / norm_product)
}
