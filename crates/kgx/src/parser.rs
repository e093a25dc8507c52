//! Turn raw model output into validated triples.
//!
//! Decoding and validation are separate steps: [`decode_candidate`] reads one JSON item into a
//! [`TripleCandidate`] without judging it, and [`TripleCandidate::validate`] decides whether it
//! becomes a [`Triple`]. A broken top level fails the whole parse; a broken item is only skipped.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::errors::{KgError, KgResult};
use crate::models::triple::Triple;

/// One item of model output before validation. Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TripleCandidate {
    #[serde(deserialize_with = "lenient_string")]
    pub head: String,
    #[serde(deserialize_with = "lenient_string")]
    pub relation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tail: String,
    #[serde(deserialize_with = "lenient_string")]
    pub evidence: String,
}

impl TripleCandidate {
    /// Keep the candidate only when all four fields are non-empty after trimming
    pub fn validate(self) -> Option<Triple> {
        Triple::new(self.head, self.relation, self.tail, self.evidence)
    }
}

// Models sometimes emit numbers or booleans where strings belong; read scalars as their text
// and anything else as empty so the item fails validation.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

/// Decode one JSON item. Only objects are candidates.
pub fn decode_candidate(item: Value) -> Option<TripleCandidate> {
    if !item.is_object() {
        return None;
    }
    serde_json::from_value(item).ok()
}

/// Parse model output that is either `{"triples": [...]}` or a bare `[...]`
pub fn parse_triples(raw: &str) -> KgResult<Vec<Triple>> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|e| KgError::malformed(format!("LLM did not return valid JSON: {}", e), raw))?;

    let items = match payload {
        Value::Object(mut map) => match map.remove("triples") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(KgError::malformed(
                    "the `triples` field is not an array",
                    raw,
                ))
            }
            None => {
                return Err(KgError::malformed(
                    "JSON object has no `triples` field",
                    raw,
                ))
            }
        },
        Value::Array(items) => items,
        _ => return Err(KgError::malformed("Unexpected JSON structure from LLM", raw)),
    };

    let total = items.len();
    let triples: Vec<Triple> = items
        .into_iter()
        .filter_map(decode_candidate)
        .filter_map(TripleCandidate::validate)
        .collect();

    if triples.len() < total {
        warn!(
            total,
            kept = triples.len(),
            "dropped invalid triple candidates"
        );
    }

    Ok(triples)
}
