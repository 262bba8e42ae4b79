//! Aggregation of per-token BIO predictions into entity spans
//!
//! Consecutive tokens of the same entity type are merged unless a token opens
//! a new span with a `B-` tag. `O` spans are dropped. A span's score is the
//! mean of its token scores.
//!
//! Tokenizers report byte offsets; emitted `start`/`end` are character offsets.

use crate::ner::sanitize::{RawEntity, RawValue};

/// Best label for one (non-special) token, with its byte offsets into the text
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrediction {
    pub label: String,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

struct Span<'a> {
    entity_type: &'a str,
    scores: Vec<f32>,
    start: usize,
    end: usize,
}

fn split_tag(label: &str) -> (bool, &str) {
    if let Some(rest) = label.strip_prefix("B-") {
        (true, rest)
    } else if let Some(rest) = label.strip_prefix("I-") {
        (false, rest)
    } else {
        (false, label)
    }
}

/// Character offset of byte position `byte`: the number of chars starting before it
fn char_offset(text: &str, byte: usize) -> RawValue {
    let chars = text.char_indices().take_while(|(i, _)| *i < byte).count();
    RawValue::U32(u32::try_from(chars).unwrap_or(u32::MAX))
}

pub fn group_entities(text: &str, tokens: &[TokenPrediction]) -> Vec<RawEntity> {
    let mut spans: Vec<Span> = Vec::new();

    for token in tokens {
        let (begins, entity_type) = split_tag(&token.label);

        match spans.last_mut() {
            Some(span) if !begins && span.entity_type == entity_type => {
                span.scores.push(token.score);
                span.end = token.end;
            }
            _ => spans.push(Span {
                entity_type,
                scores: vec![token.score],
                start: token.start,
                end: token.end,
            }),
        }
    }

    spans
        .into_iter()
        .filter(|span| span.entity_type != "O")
        .map(|span| {
            let score = span.scores.iter().sum::<f32>() / span.scores.len() as f32;
            let word = text.get(span.start..span.end).unwrap_or_default().trim();

            RawEntity::new()
                .with("entity_group", RawValue::Str(span.entity_type.to_string()))
                .with("score", RawValue::F32(score))
                .with("word", RawValue::Str(word.to_string()))
                .with("start", char_offset(text, span.start))
                .with("end", char_offset(text, span.end))
        })
        .collect()
}
