//! Embedding and similarity scoring

pub mod embeddings;
pub mod similarity;
