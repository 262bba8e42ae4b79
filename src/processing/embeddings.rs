//! Sentence embeddings using Model2Vec

use crate::error::{Result, InsightError};
use crate::models::ModelFiles;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Anything that maps a text to a dense vector
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct Model2VecEmbedder {
    model: StaticModel,
}

impl Model2VecEmbedder {
    pub fn load(files: &ModelFiles) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", files.dir().display());

        let model = StaticModel::from_pretrained(
            files.dir(),
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e: anyhow::Error| {
            InsightError::ModelLoading(format!("Failed to load embedding model: {:#}", e))
        })?;

        info!("Embedding model loaded in {:.2?}", start_time.elapsed());

        Ok(Self { model })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // model2vec panics on tokenizer failure instead of returning an error
        let embedding = panic::catch_unwind(AssertUnwindSafe(|| self.model.encode_single(text)))
            .map_err(|payload| {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "embedding backend panicked".to_string());
                InsightError::SimilarityComputation(msg)
            })?;

        debug!("Embedded {} chars into {} dims", text.len(), embedding.len());
        Ok(embedding)
    }
}
