//! Normalization of raw recognizer output into JSON-safe primitives
//!
//! Token-classification heads hand back scores as `f32` (sometimes `f16`/`bf16`
//! when weights are loaded in half precision) and offsets as `u32`. None of
//! those may cross the analyzer boundary: every float-like value becomes an
//! `f64`, every integer-like value an `i64`.

use half::{bf16, f16};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single field value as produced by a recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Str(String),
    F64(f64),
    F32(f32),
    F16(f16),
    BF16(bf16),
    I64(i64),
    I32(i32),
    U64(u64),
    U32(u32),
    List(Vec<RawValue>),
}

impl RawValue {
    /// True when the value is already a plain JSON-compatible primitive
    pub fn is_plain(&self) -> bool {
        match self {
            RawValue::Null
            | RawValue::Bool(_)
            | RawValue::Str(_)
            | RawValue::F64(_)
            | RawValue::I64(_)
            | RawValue::U64(_) => true,
            RawValue::List(items) => items.iter().all(RawValue::is_plain),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn sanitized(&self) -> RawValue {
        match self {
            RawValue::F32(v) => RawValue::F64(f64::from(*v)),
            RawValue::F16(v) => RawValue::F64(v.to_f64()),
            RawValue::BF16(v) => RawValue::F64(v.to_f64()),
            RawValue::I32(v) => RawValue::I64(i64::from(*v)),
            RawValue::U32(v) => RawValue::I64(i64::from(*v)),
            RawValue::U64(v) => match i64::try_from(*v) {
                Ok(v) => RawValue::I64(v),
                Err(_) => RawValue::U64(*v),
            },
            RawValue::List(items) => RawValue::List(items.iter().map(RawValue::sanitized).collect()),
            other => other.clone(),
        }
    }
}

impl From<&RawValue> for Value {
    fn from(value: &RawValue) -> Self {
        let float = |v: f64| Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null);
        match value {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Str(s) => Value::String(s.clone()),
            RawValue::F64(v) => float(*v),
            RawValue::F32(v) => float(f64::from(*v)),
            RawValue::F16(v) => float(v.to_f64()),
            RawValue::BF16(v) => float(v.to_f64()),
            RawValue::I64(v) => Value::from(*v),
            RawValue::I32(v) => Value::from(*v),
            RawValue::U64(v) => Value::from(*v),
            RawValue::U32(v) => Value::from(*v),
            RawValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
        }
    }
}

/// One recognizer record: field name to value, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntity {
    fields: Vec<(String, RawValue)>,
}

impl RawEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: RawValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field, keeping the original position on replace
    pub fn insert(&mut self, key: &str, value: RawValue) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_plain(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_plain())
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v)))
            .collect();
        Value::Object(map)
    }
}

/// Coerce every numeric field to `f64`/`i64`; strings, booleans and unknown
/// shapes are left as they are. Never drops or renames a field.
pub fn sanitize_entity(entity: &RawEntity) -> RawEntity {
    RawEntity {
        fields: entity
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.sanitized()))
            .collect(),
    }
}

/// A sanitized entity as it crosses the analyzer boundary.
///
/// Fields a recognizer emits beyond the five known ones are kept in `extra`
/// and flattened back into the serialized record. A known field whose value
/// cannot be coerced to the field's type is dropped, never moved to `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "entity_group")]
    pub label: String,
    #[serde(rename = "word")]
    pub text: String,
    pub score: f64,
    pub start: i64,
    pub end: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&RawEntity> for Entity {
    fn from(raw: &RawEntity) -> Self {
        let clean = sanitize_entity(raw);

        let mut label = String::new();
        let mut text = String::new();
        let mut score = 0.0;
        let mut start = 0;
        let mut end = 0;
        let mut extra = Map::new();

        for (key, value) in clean.iter() {
            let kept = match key {
                "entity_group" => value.as_str().map(|s| label = s.to_string()),
                "word" => value.as_str().map(|s| text = s.to_string()),
                "score" => as_score(value).map(|v| score = v),
                "start" => as_offset(value).map(|v| start = v),
                "end" => as_offset(value).map(|v| end = v),
                _ => {
                    extra.insert(key.to_string(), Value::from(value));
                    Some(())
                }
            };
            if kept.is_none() {
                debug!("Dropping entity field '{}' with unusable value {:?}", key, value);
            }
        }

        Entity {
            label,
            text,
            score,
            start,
            end,
            extra,
        }
    }
}

fn as_score(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::F64(v) => Some(*v),
        RawValue::I64(v) => Some(*v as f64),
        RawValue::U64(v) => Some(*v as f64),
        RawValue::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_offset(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::I64(v) => Some(*v),
        RawValue::F64(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(*v as i64),
        RawValue::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}
