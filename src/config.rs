//! Configuration management for resume insight

use crate::error::{Result, InsightError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LIGHTWEIGHT_ENV: &str = "LIGHTWEIGHT_MODELS";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub skills: SkillConfig,
    pub generation: GenerationConfig,
    pub recommendations: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    /// NER model used when `LIGHTWEIGHT_MODELS=true`
    pub lightweight_ner_model: String,
    pub full_ner_model: String,
    pub embedding_model: String,
    pub local_llm_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    pub allowed_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub cloud_model: String,
    pub api_base_url: String,
    pub temperature: f64,
    pub top_p: f64,
    pub repeat_penalty: f32,
    pub seed: Option<u64>,
    pub summary_max_tokens: usize,
    pub recommendations_max_tokens: usize,
    pub discrepancies_max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub max_items: usize,
    pub min_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-insight")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                lightweight_ner_model: "dslim/bert-base-NER".to_string(),
                full_ner_model: "dbmdz/bert-large-cased-finetuned-conll03-english".to_string(),
                embedding_model: "minishlab/potion-base-8M".to_string(),
                local_llm_model: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
            },
            skills: SkillConfig {
                allowed_labels: vec!["MISC".to_string()],
            },
            generation: GenerationConfig {
                cloud_model: "gpt-3.5-turbo".to_string(),
                api_base_url: "https://api.openai.com/v1".to_string(),
                temperature: 0.7,
                top_p: 0.9,
                repeat_penalty: 1.1,
                seed: None,
                summary_max_tokens: 256,
                recommendations_max_tokens: 384,
                discrepancies_max_tokens: 512,
            },
            recommendations: RecommendationConfig {
                max_items: 8,
                min_length: 10,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, writing defaults there if it does not exist yet
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| InsightError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| InsightError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-insight")
            .join("config.toml")
    }

    /// NER model repo for the given weight class
    pub fn ner_model(&self, lightweight: bool) -> &str {
        if lightweight {
            &self.models.lightweight_ner_model
        } else {
            &self.models.full_ner_model
        }
    }
}

/// The two settings read from the process environment at startup
#[derive(Debug, Clone, Default)]
pub struct RuntimeSettings {
    pub use_lightweight_models: bool,
    pub api_key: Option<String>,
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(LIGHTWEIGHT_ENV).ok().as_deref(),
            std::env::var(API_KEY_ENV).ok().as_deref(),
        )
    }

    pub fn from_values(lightweight: Option<&str>, api_key: Option<&str>) -> Self {
        let use_lightweight_models = lightweight
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Self {
            use_lightweight_models,
            api_key,
        }
    }

    pub fn api_credential_present(&self) -> bool {
        self.api_key.is_some()
    }
}
