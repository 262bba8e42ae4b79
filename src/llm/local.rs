//! On-device text generation using Candle

use crate::config::GenerationConfig;
use crate::error::{Result, InsightError};
use crate::models::{ModelFiles, WeightFiles};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::{llama, phi3};
use log::{debug, info};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokenizers::Tokenizer;

/// Tokens looked back over when applying the repeat penalty
const REPEAT_LAST_N: usize = 64;
const DEFAULT_CONTEXT_LENGTH: usize = 2048;
const EOS_TOKENS: &[&str] = &["</s>", "<|endoftext|>", "<|end|>", "<|eot_id|>"];

/// A causal language model that continues a prompt
pub trait LocalGenerator: Send {
    /// Generated continuation only, never the prompt itself
    fn generate(&mut self, prompt: &str, max_new_tokens: usize) -> Result<String>;
}

enum CausalLm {
    Llama {
        model: llama::Llama,
        cache: llama::Cache,
        config: llama::Config,
        device: Device,
    },
    Phi3(phi3::Model),
}

impl CausalLm {
    fn forward(&mut self, input_ids: &Tensor, start_pos: usize) -> candle_core::Result<Tensor> {
        match self {
            CausalLm::Llama { model, cache, .. } => model.forward(input_ids, start_pos, cache),
            CausalLm::Phi3(model) => model.forward(input_ids, start_pos),
        }
    }

    fn reset_kv_cache(&mut self) -> candle_core::Result<()> {
        match self {
            CausalLm::Llama {
                cache,
                config,
                device,
                ..
            } => {
                *cache = llama::Cache::new(true, DType::F32, config, device)?;
                Ok(())
            }
            CausalLm::Phi3(model) => {
                model.clear_kv_cache();
                Ok(())
            }
        }
    }
}

/// Chat framing expected by the instruction-tuned checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTemplate {
    Phi3,
    Zephyr,
}

impl ChatTemplate {
    pub fn apply(&self, prompt: &str) -> String {
        match self {
            ChatTemplate::Phi3 => format!("<|user|>\n{}<|end|>\n<|assistant|>\n", prompt.trim()),
            ChatTemplate::Zephyr => format!("<|user|>\n{}</s>\n<|assistant|>\n", prompt.trim()),
        }
    }
}

pub struct LocalEngine {
    model: CausalLm,
    tokenizer: Tokenizer,
    device: Device,
    template: ChatTemplate,
    eos_tokens: Vec<u32>,
    context_length: usize,
    logits_processor: LogitsProcessor,
    repeat_penalty: f32,
}

fn generation_error(e: impl std::fmt::Display) -> InsightError {
    InsightError::Generation(e.to_string())
}

impl LocalEngine {
    pub fn load(files: &ModelFiles, device: &Device, config: &GenerationConfig) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading local language model: {}", files.repo_id);

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| InsightError::ModelLoading(format!("Failed to load tokenizer: {}", e)))?;

        let config_content = std::fs::read_to_string(&files.config)?;
        let model_config: serde_json::Value = serde_json::from_str(&config_content).map_err(|e| {
            InsightError::ModelLoading(format!("Failed to parse model config: {}", e))
        })?;

        let vb = match &files.weights {
            WeightFiles::Safetensors(paths) => unsafe {
                VarBuilder::from_mmaped_safetensors(paths, DType::F32, device)?
            },
            WeightFiles::Pytorch(path) => VarBuilder::from_pth(path, DType::F32, device)?,
        };

        let (model, template) = match architecture(&model_config) {
            Architecture::Phi3 => {
                debug!("Loading Phi-3 architecture");
                let phi_config: phi3::Config = serde_json::from_value(model_config.clone())
                    .map_err(|e| {
                        InsightError::ModelLoading(format!("Failed to parse Phi-3 config: {}", e))
                    })?;
                let model = phi3::Model::new(&phi_config, vb)?;
                (CausalLm::Phi3(model), ChatTemplate::Phi3)
            }
            Architecture::Llama => {
                debug!("Loading Llama architecture");
                let llama_config: llama::LlamaConfig = serde_json::from_value(model_config.clone())
                    .map_err(|e| {
                        InsightError::ModelLoading(format!("Failed to parse Llama config: {}", e))
                    })?;
                let config = llama_config.into_config(false);
                let model = llama::Llama::load(vb, &config)?;
                let cache = llama::Cache::new(true, DType::F32, &config, device)?;
                let model = CausalLm::Llama {
                    model,
                    cache,
                    config,
                    device: device.clone(),
                };
                (model, ChatTemplate::Zephyr)
            }
        };

        let eos_tokens = eos_token_ids(&model_config, &tokenizer);
        let context_length = model_config["max_position_embeddings"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_CONTEXT_LENGTH);

        let seed = config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(299_792_458)
        });
        let temperature = (config.temperature > 0.0).then_some(config.temperature);
        let logits_processor = LogitsProcessor::new(seed, temperature, Some(config.top_p));

        info!("Local language model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            template,
            eos_tokens,
            context_length,
            logits_processor,
            repeat_penalty: config.repeat_penalty,
        })
    }

    fn next_logits(&mut self, input: &[u32], start_pos: usize) -> candle_core::Result<Tensor> {
        let input_tensor = Tensor::new(input, &self.device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input_tensor, start_pos)?.squeeze(0)?;

        // Llama returns only the last position, Phi-3 keeps a length-1 sequence axis
        let logits = if logits.rank() == 2 {
            let seq_len = logits.dim(0)?;
            logits.i(seq_len - 1)?
        } else {
            logits
        };
        logits.to_dtype(DType::F32)
    }
}

impl LocalGenerator for LocalEngine {
    fn generate(&mut self, prompt: &str, max_new_tokens: usize) -> Result<String> {
        let start_time = Instant::now();
        self.model.reset_kv_cache().map_err(generation_error)?;

        let formatted = self.template.apply(prompt);
        let encoding = self
            .tokenizer
            .encode(formatted.as_str(), true)
            .map_err(|e| InsightError::Generation(format!("Failed to tokenize prompt: {}", e)))?;

        let mut tokens = encoding.get_ids().to_vec();
        let budget = self.context_length.saturating_sub(max_new_tokens).max(1);
        if tokens.len() > budget {
            debug!("Prompt has {} tokens, keeping the last {}", tokens.len(), budget);
            tokens.drain(..tokens.len() - budget);
        }
        let prompt_len = tokens.len();

        let mut logits = self.next_logits(&tokens, 0).map_err(generation_error)?;

        for step in 0..max_new_tokens {
            let logits_for_sampling = if self.repeat_penalty == 1.0 {
                logits.clone()
            } else {
                let start_at = tokens.len().saturating_sub(REPEAT_LAST_N);
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    self.repeat_penalty,
                    &tokens[start_at..],
                )
                .map_err(generation_error)?
            };

            let next_token = self
                .logits_processor
                .sample(&logits_for_sampling)
                .map_err(generation_error)?;

            if self.eos_tokens.contains(&next_token) {
                debug!("End of sequence after {} tokens", step);
                break;
            }
            tokens.push(next_token);

            logits = self
                .next_logits(&[next_token], prompt_len + step)
                .map_err(generation_error)?;
        }

        let generated = &tokens[prompt_len..];
        let text = self
            .tokenizer
            .decode(generated, true)
            .map_err(|e| InsightError::Generation(format!("Failed to decode output: {}", e)))?;

        let elapsed = start_time.elapsed();
        info!(
            "Generated {} tokens in {:.2?} ({:.1} tokens/sec)",
            generated.len(),
            elapsed,
            generated.len() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
        );

        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Architecture {
    Llama,
    Phi3,
}

fn architecture(config: &serde_json::Value) -> Architecture {
    let model_type = config["model_type"].as_str().unwrap_or("");
    let arch = config["architectures"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .unwrap_or("");

    match (model_type, arch) {
        ("phi3", _) | (_, "Phi3ForCausalLM") => Architecture::Phi3,
        _ => Architecture::Llama,
    }
}

/// End-of-sequence ids from the model config plus any well-known EOS tokens in the vocabulary
fn eos_token_ids(config: &serde_json::Value, tokenizer: &Tokenizer) -> Vec<u32> {
    let mut ids: Vec<u32> = match &config["eos_token_id"] {
        serde_json::Value::Number(n) => n.as_u64().map(|id| vec![id as u32]).unwrap_or_default(),
        serde_json::Value::Array(values) => values
            .iter()
            .filter_map(|v| v.as_u64())
            .map(|id| id as u32)
            .collect(),
        _ => Vec::new(),
    };

    for token in EOS_TOKENS {
        if let Some(id) = tokenizer.token_to_id(token) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}
