use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::KgResult;
use crate::models::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.7,
            max_tokens: 1200,
        }
    }
}

impl GenerationParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Base trait for the LLM gateway
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and return the raw text of the model's reply
    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> KgResult<(String, Usage)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_serialization() {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        let value = serde_json::to_value(&usage).unwrap();
        assert_eq!(value["input_tokens"], json!(10));
        assert_eq!(value["output_tokens"], json!(20));
        assert_eq!(value["total_tokens"], json!(30));
    }

    #[test]
    fn test_generation_params_defaults_and_overrides() {
        let params = GenerationParams::default();
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.top_p, 0.7);
        assert_eq!(params.max_tokens, 1200);

        let params = params.with_temperature(0.0).with_top_p(1.0).with_max_tokens(4096);
        assert_eq!(params.temperature, 0.0);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.max_tokens, 4096);
    }
}
