//! Routes prompts to the selected backend and normalizes what comes back

use crate::error::{Result, InsightError};
use crate::llm::backend::GenerationBackend;
use log::{debug, error, warn};
use std::sync::Arc;

/// Returned for every request while no backend could be initialized
pub const GENERATION_UNAVAILABLE_PLACEHOLDER: &str =
    "[Generation unavailable: no language model backend could be initialized]";

/// Returned when the backend answered with nothing but whitespace
pub const NO_USABLE_RESPONSE: &str = "[No usable response was generated]";

pub struct GenerationDispatcher {
    backend: GenerationBackend,
}

impl GenerationDispatcher {
    pub fn new(backend: GenerationBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &GenerationBackend {
        &self.backend
    }

    /// Plain-text completion of `prompt`, at most `max_tokens` tokens long
    pub async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        debug!(
            "Dispatching prompt ({} chars) to {} backend",
            prompt.len(),
            self.backend.name()
        );

        let raw = match &self.backend {
            GenerationBackend::Unavailable { reason } => {
                warn!("Generation requested but backend is unavailable: {}", reason);
                return Ok(GENERATION_UNAVAILABLE_PLACEHOLDER.to_string());
            }
            GenerationBackend::Cloud(client) => client.complete(prompt, max_tokens).await,
            GenerationBackend::Local(generator) => {
                // Inference is CPU-bound; keep it off the async workers
                let mut generator = Arc::clone(generator).lock_owned().await;
                let prompt = prompt.to_string();
                tokio::task::spawn_blocking(move || generator.generate(&prompt, max_tokens))
                    .await
                    .unwrap_or_else(|e| {
                        Err(InsightError::Generation(format!("local generation task failed: {}", e)))
                    })
            }
        }
        .map_err(|e| {
            error!("Generation failed on {} backend: {}", self.backend.name(), e);
            match e {
                InsightError::Generation(msg) => InsightError::Generation(msg),
                other => InsightError::Generation(other.to_string()),
            }
        })?;

        let text = raw.trim();
        if text.is_empty() {
            warn!("Backend returned an empty response");
            return Ok(NO_USABLE_RESPONSE.to_string());
        }
        Ok(text.to_string())
    }
}
