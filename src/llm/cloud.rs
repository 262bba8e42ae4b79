//! OpenAI-compatible chat-completions client for the hosted backend

use crate::config::GenerationConfig;
use crate::error::{Result, InsightError};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Single-shot chat completion calls. No retries; a failed call is reported once.
#[derive(Clone)]
pub struct CloudClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
}

impl CloudClient {
    pub fn new(api_key: Option<String>, config: &GenerationConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.cloud_model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` as one user message and return the trimmed reply text
    pub async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        // The credential is only checked here, not at construction
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            InsightError::Generation("no API credential configured for the hosted backend".to_string())
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} (model: {}, max_tokens: {})", url, self.model, max_tokens);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Generation(format!("request to hosted backend failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!("Hosted backend returned {}: {}", status, message);
            return Err(InsightError::Generation(format!(
                "hosted backend returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            InsightError::Generation(format!("unexpected response from hosted backend: {}", e))
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            InsightError::Generation("hosted backend returned no choices".to_string())
        })?;
        let content = choice.message.content.ok_or_else(|| {
            InsightError::Generation("hosted backend returned a choice without content".to_string())
        })?;

        Ok(content.trim().to_string())
    }
}
