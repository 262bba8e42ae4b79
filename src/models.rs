//! Hugging Face Hub model fetching and on-disk caching

use crate::error::{Result, InsightError};
use hf_hub::api::tokio::{Api, ApiBuilder, ApiRepo};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const SAFETENSORS_INDEX: &str = "model.safetensors.index.json";

/// Weight files of a model, in the format they were published in
#[derive(Debug, Clone, PartialEq)]
pub enum WeightFiles {
    Safetensors(Vec<PathBuf>),
    Pytorch(PathBuf),
}

/// Local paths of everything needed to load a model
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub repo_id: String,
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: WeightFiles,
}

impl ModelFiles {
    /// Snapshot directory holding the model files
    pub fn dir(&self) -> &Path {
        self.tokenizer.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Downloads model files into the models directory, reusing anything already cached
pub struct ModelFetcher {
    api: Api,
}

impl ModelFetcher {
    pub fn new(models_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(models_dir).map_err(|e| {
            InsightError::ModelLoading(format!("Failed to create models directory: {}", e))
        })?;

        let api = ApiBuilder::new()
            .with_cache_dir(models_dir.to_path_buf())
            .with_progress(false)
            .build()
            .map_err(|e| InsightError::ModelLoading(format!("Failed to initialize HF API: {}", e)))?;

        Ok(Self { api })
    }

    pub async fn fetch(&self, repo_id: &str) -> Result<ModelFiles> {
        info!("Resolving model files for {}", repo_id);
        let repo = self.api.model(repo_id.to_string());

        let config = get_file(&repo, repo_id, "config.json").await?;
        let tokenizer = get_file(&repo, repo_id, "tokenizer.json").await?;
        let weights = self.fetch_weights(&repo, repo_id).await?;

        Ok(ModelFiles {
            repo_id: repo_id.to_string(),
            config,
            tokenizer,
            weights,
        })
    }

    async fn fetch_weights(&self, repo: &ApiRepo, repo_id: &str) -> Result<WeightFiles> {
        // Sharded safetensors first, then a single file, then pytorch pickles
        if let Ok(index_path) = repo.get(SAFETENSORS_INDEX).await {
            let content = tokio::fs::read_to_string(&index_path).await?;
            let index: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
                InsightError::ModelLoading(format!("Failed to parse safetensors index: {}", e))
            })?;

            let mut paths = Vec::new();
            for shard in shard_files(&index)? {
                debug!("Fetching shard {} of {}", shard, repo_id);
                paths.push(get_file(repo, repo_id, &shard).await?);
            }
            return Ok(WeightFiles::Safetensors(paths));
        }

        if let Ok(path) = repo.get("model.safetensors").await {
            return Ok(WeightFiles::Safetensors(vec![path]));
        }

        let path = get_file(repo, repo_id, "pytorch_model.bin").await?;
        Ok(WeightFiles::Pytorch(path))
    }
}

async fn get_file(repo: &ApiRepo, repo_id: &str, file: &str) -> Result<PathBuf> {
    repo.get(file).await.map_err(|e| {
        InsightError::ModelLoading(format!("Failed to download {} from {}: {}", file, repo_id, e))
    })
}

/// Unique shard file names referenced by a safetensors index, sorted
pub fn shard_files(index: &serde_json::Value) -> Result<Vec<String>> {
    let weight_map = index
        .get("weight_map")
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            InsightError::ModelLoading(
                "Invalid safetensors index format: missing weight_map".to_string(),
            )
        })?;

    let shards: BTreeSet<String> = weight_map
        .values()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();

    Ok(shards.into_iter().collect())
}
