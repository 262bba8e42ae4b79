//! BERT token-classification NER running on candle

use crate::error::{Result, InsightError};
use crate::models::{ModelFiles, WeightFiles};
use crate::ner::grouping::{group_entities, TokenPrediction};
use crate::ner::sanitize::RawEntity;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use log::{debug, info};
use tokenizers::{Tokenizer, TruncationParams};

/// Maximum tokens per forward pass; longer inputs are split into overflow windows
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Anything that turns text into grouped entity records
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<RawEntity>>;
}

pub struct BertTokenClassifier {
    bert: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: Vec<String>,
    device: Device,
}

fn inference_error(e: impl std::fmt::Display) -> InsightError {
    InsightError::EntityInference(e.to_string())
}

impl BertTokenClassifier {
    pub fn load(files: &ModelFiles, device: &Device) -> Result<Self> {
        info!("Loading NER model: {}", files.repo_id);

        let config_content = std::fs::read_to_string(&files.config)?;
        let config: BertConfig = serde_json::from_str(&config_content).map_err(|e| {
            InsightError::ModelLoading(format!("Failed to parse BERT config: {}", e))
        })?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_content)?;
        let id2label = parse_id2label(&raw_config)?;
        let hidden_size = raw_config["hidden_size"]
            .as_u64()
            .ok_or_else(|| InsightError::ModelLoading("config.json has no hidden_size".to_string()))?
            as usize;

        let vb = match &files.weights {
            WeightFiles::Safetensors(paths) => unsafe {
                VarBuilder::from_mmaped_safetensors(paths, DType::F32, device)?
            },
            WeightFiles::Pytorch(path) => VarBuilder::from_pth(path, DType::F32, device)?,
        };

        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else {
            BertModel::load(vb.clone(), &config)?
        };
        let classifier = candle_nn::linear(hidden_size, id2label.len(), vb.pp("classifier"))?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| {
            InsightError::ModelLoading(format!("Failed to load tokenizer: {}", e))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| InsightError::ModelLoading(format!("Failed to configure truncation: {}", e)))?;
        tokenizer.with_padding(None);

        debug!("NER labels: {:?}", id2label);

        Ok(Self {
            bert,
            classifier,
            tokenizer,
            id2label,
            device: device.clone(),
        })
    }

    fn predict_window(
        &self,
        ids: &[u32],
        attention: &[u32],
    ) -> candle_core::Result<Vec<Vec<f32>>> {
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(attention, &self.device)?.unsqueeze(0)?;

        let hidden = self
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?;

        probs.squeeze(0)?.to_vec2::<f32>()
    }
}

impl EntityRecognizer for BertTokenClassifier {
    fn recognize(&self, text: &str) -> Result<Vec<RawEntity>> {
        let encoding = self.tokenizer.encode(text, true).map_err(inference_error)?;

        let mut tokens = Vec::new();
        for window in std::iter::once(&encoding).chain(encoding.get_overflowing()) {
            let probs = self
                .predict_window(window.get_ids(), window.get_attention_mask())
                .map_err(inference_error)?;

            let special = window.get_special_tokens_mask();
            let offsets = window.get_offsets();

            for (i, row) in probs.iter().enumerate() {
                if special.get(i).copied().unwrap_or(1) == 1 {
                    continue;
                }
                let Some((label_id, score)) = argmax(row) else {
                    continue;
                };
                let label = self.id2label.get(label_id).ok_or_else(|| {
                    inference_error(format!("label id {} outside id2label", label_id))
                })?;
                let Some(&(start, end)) = offsets.get(i) else {
                    continue;
                };

                tokens.push(TokenPrediction {
                    label: label.clone(),
                    score,
                    start,
                    end,
                });
            }
        }

        Ok(group_entities(text, &tokens))
    }
}

fn argmax(row: &[f32]) -> Option<(usize, f32)> {
    row.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}

/// Label names indexed by class id, from a `config.json` `id2label` table
pub fn parse_id2label(config: &serde_json::Value) -> Result<Vec<String>> {
    let table = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| InsightError::ModelLoading("config.json has no id2label table".to_string()))?;

    let mut labels = vec![None; table.len()];
    for (id, label) in table {
        let idx: usize = id
            .parse()
            .map_err(|_| InsightError::ModelLoading(format!("Non-numeric label id '{}'", id)))?;
        let slot = labels
            .get_mut(idx)
            .ok_or_else(|| InsightError::ModelLoading(format!("Label id {} is not contiguous", idx)))?;
        *slot = label.as_str().map(str::to_string);
    }

    labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            label.ok_or_else(|| InsightError::ModelLoading(format!("Label {} is missing or not a string", i)))
        })
        .collect()
}
