//! Process-wide choice of the generation backend

use crate::config::{Config, RuntimeSettings};
use crate::device::device_with_override;
use crate::error::Result;
use crate::llm::cloud::CloudClient;
use crate::llm::local::{LocalEngine, LocalGenerator};
use crate::models::ModelFetcher;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Cloud,
}

/// Lightweight mode always runs locally; otherwise the hosted API is used
/// only when a credential is present.
pub fn select_backend(lightweight: bool, credential_present: bool) -> BackendKind {
    match (lightweight, credential_present) {
        (false, true) => BackendKind::Cloud,
        _ => BackendKind::Local,
    }
}

/// The backend answering every generation request for the life of the process
pub enum GenerationBackend {
    /// Candle inference is not reentrant, so calls are serialized
    Local(Arc<Mutex<Box<dyn LocalGenerator>>>),
    Cloud(CloudClient),
    Unavailable { reason: String },
}

impl GenerationBackend {
    pub fn local(generator: Box<dyn LocalGenerator>) -> Self {
        GenerationBackend::Local(Arc::new(Mutex::new(generator)))
    }

    /// A failed local load degrades to `Unavailable` instead of failing startup
    pub fn from_local_result(result: Result<Box<dyn LocalGenerator>>) -> Self {
        match result {
            Ok(generator) => Self::local(generator),
            Err(e) => {
                warn!("Local generation model failed to load, generation disabled: {}", e);
                GenerationBackend::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Select and construct the backend once, at startup
    pub async fn initialize(config: &Config, settings: &RuntimeSettings, fetcher: &ModelFetcher) -> Self {
        let kind = select_backend(
            settings.use_lightweight_models,
            settings.api_credential_present(),
        );

        let backend = match kind {
            BackendKind::Cloud => {
                GenerationBackend::Cloud(CloudClient::new(settings.api_key.clone(), &config.generation))
            }
            BackendKind::Local => Self::from_local_result(load_local(config, fetcher).await),
        };

        info!("Generation backend: {}", backend);
        backend
    }

    pub fn kind(&self) -> Option<BackendKind> {
        match self {
            GenerationBackend::Local(_) => Some(BackendKind::Local),
            GenerationBackend::Cloud(_) => Some(BackendKind::Cloud),
            GenerationBackend::Unavailable { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerationBackend::Local(_) => "local",
            GenerationBackend::Cloud(_) => "cloud",
            GenerationBackend::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        self.kind().is_some()
    }
}

impl fmt::Display for GenerationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationBackend::Cloud(client) => write!(f, "cloud ({})", client.model()),
            GenerationBackend::Unavailable { reason } => write!(f, "unavailable ({})", reason),
            GenerationBackend::Local(_) => write!(f, "local"),
        }
    }
}

async fn load_local(config: &Config, fetcher: &ModelFetcher) -> Result<Box<dyn LocalGenerator>> {
    let files = fetcher.fetch(&config.models.local_llm_model).await?;
    let device = device_with_override()?;
    let engine = LocalEngine::load(&files, &device, &config.generation)?;
    Ok(Box::new(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightError;

    struct Echo;

    impl LocalGenerator for Echo {
        fn generate(&mut self, prompt: &str, _max_new_tokens: usize) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_selection_table() {
        assert_eq!(select_backend(true, true), BackendKind::Local);
        assert_eq!(select_backend(true, false), BackendKind::Local);
        assert_eq!(select_backend(false, true), BackendKind::Cloud);
        assert_eq!(select_backend(false, false), BackendKind::Local);
    }

    #[test]
    fn test_failed_local_load_is_observable() {
        let backend = GenerationBackend::from_local_result(Err(InsightError::ModelLoading(
            "weights not found".into(),
        )));

        assert!(!backend.is_available());
        assert_eq!(backend.name(), "unavailable");
        assert!(backend.to_string().contains("weights not found"));
    }

    #[test]
    fn test_successful_local_load() {
        let backend = GenerationBackend::from_local_result(Ok(Box::new(Echo)));
        assert_eq!(backend.kind(), Some(BackendKind::Local));
    }

    #[tokio::test]
    async fn test_credential_without_lightweight_builds_cloud_client() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let fetcher = ModelFetcher::new(temp_dir.path()).unwrap();
        let settings = RuntimeSettings::from_values(Some("false"), Some("sk-test"));

        let backend = GenerationBackend::initialize(&Config::default(), &settings, &fetcher).await;

        assert_eq!(backend.kind(), Some(BackendKind::Cloud));
        assert_eq!(backend.to_string(), "cloud (gpt-3.5-turbo)");
    }
}
