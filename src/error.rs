//! Error handling for resume insight

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("NER model inference failed: {0}")]
    EntityInference(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid input: cannot compute similarity with zero-vector embeddings ({0})")]
    DegenerateVector(String),

    #[error("Similarity computation failed: {0}")]
    SimilarityComputation(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InsightError>;

impl InsightError {
    /// Stable name of the failure kind, for the boundary layer.
    pub fn kind(&self) -> &'static str {
        match self {
            InsightError::EntityInference(_) => "entity_inference_failure",
            InsightError::Embedding(_) => "embedding_failure",
            InsightError::DegenerateVector(_) => "degenerate_vector_failure",
            InsightError::SimilarityComputation(_) => "similarity_computation_failure",
            InsightError::Generation(_) => "generation_failure",
            InsightError::InputValidation(_) => "input_validation_failure",
            InsightError::Io(_) => "io_error",
            InsightError::Configuration(_) => "configuration_error",
            InsightError::ModelLoading(_) => "model_loading_error",
            InsightError::Serialization(_) => "serialization_error",
        }
    }
}

/// Candle errors only surface through `?` while loading weights; inference
/// paths map them to their own kind explicitly.
impl From<candle_core::Error> for InsightError {
    fn from(err: candle_core::Error) -> Self {
        InsightError::ModelLoading(err.to_string())
    }
}
