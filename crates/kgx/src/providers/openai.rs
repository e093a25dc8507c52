use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::base::{GenerationParams, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{check_openai_context_length_error, create_request, openai_response_to_text};
use crate::errors::{KgError, KgResult};
use crate::models::message::Message;

/// Gateway to any endpoint speaking the OpenAI chat completions protocol
pub struct OpenAiProvider {
    client: Client,
    host: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> KgResult<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                KgError::Configuration(
                    "Missing API key: set KGX_PROVIDER__API_KEY or pass one explicitly".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KgError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: config.host,
            api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> KgResult<Value> {
        let url = format!("{}/chat/completions", self.host.trim_end_matches('/'));
        debug!(%url, model = %self.model, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(KgError::Upstream(format!("Server error: {}", status)))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(KgError::Upstream(format!(
                    "Request failed: {}\nResponse: {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> KgResult<(String, Usage)> {
        let payload = create_request(&self.model, messages, params);
        let response = self.post(payload).await?;

        // Some compatible gateways answer 200 with an error object
        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(KgError::Upstream(err.to_string()));
            }
            return Err(KgError::Upstream(format!("OpenAI API error: {}", error)));
        }

        let text = openai_response_to_text(&response)?;
        let usage = Self::get_usage(&response);
        debug!(?usage, "chat completion finished");

        Ok((text, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(host: String) -> OpenAiProviderConfig {
        OpenAiProviderConfig::new(Some("test_api_key".to_string()))
            .with_host(host)
            .with_model("test-model")
    }

    async fn _setup_mock_server(status: u16, response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider =
            OpenAiProvider::new(test_config(format!("{}/v1", mock_server.uri()))).unwrap();
        (mock_server, provider)
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let result = OpenAiProvider::new(OpenAiProviderConfig::new(None));
        assert!(matches!(result, Err(KgError::Configuration(_))));

        let result = OpenAiProvider::new(OpenAiProviderConfig::new(Some("   ".to_string())));
        assert!(matches!(result, Err(KgError::Configuration(_))));
    }

    #[test]
    fn test_get_usage_calculated_total() {
        let response = json!({
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 20
            }
        });

        let usage = OpenAiProvider::get_usage(&response);
        assert_eq!(usage.input_tokens, Some(10));
        assert_eq!(usage.output_tokens, Some(20));
        assert_eq!(usage.total_tokens, Some(30));

        assert_eq!(OpenAiProvider::get_usage(&json!({})), Usage::default());
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "[{\"head\":\"a\"}]"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, provider) = _setup_mock_server(200, response_body).await;
        let messages = vec![Message::system("Output JSON."), Message::user("Extract.")];

        let (text, usage) = provider
            .complete(&messages, &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(text, "[{\"head\":\"a\"}]");
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));
    }

    #[tokio::test]
    async fn test_complete_sends_model_auth_and_params() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 64,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            OpenAiProvider::new(test_config(format!("{}/v1/", mock_server.uri()))).unwrap();
        let (text, usage) = provider
            .complete(
                &[Message::system("sys"), Message::user("usr")],
                &GenerationParams::default().with_max_tokens(64),
            )
            .await
            .unwrap();

        assert_eq!(text, "ok");
        assert_eq!(usage, Usage::default());
    }

    #[tokio::test]
    async fn test_server_error_is_upstream() {
        let (_server, provider) = _setup_mock_server(503, json!({"detail": "down"})).await;
        let result = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await;

        match result {
            Err(KgError::Upstream(message)) => assert!(message.contains("503")),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_upstream() {
        let (_server, provider) =
            _setup_mock_server(401, json!({"error": {"message": "bad key"}})).await;
        let result = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await;

        match result {
            Err(KgError::Upstream(message)) => {
                assert!(message.contains("401"));
                assert!(message.contains("bad key"));
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_payload_is_upstream() {
        let (_server, provider) = _setup_mock_server(
            200,
            json!({"error": {"code": "context_length_exceeded", "message": "too long"}}),
        )
        .await;
        let result = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await;

        match result {
            Err(KgError::Upstream(message)) => assert!(message.contains("Input message too long")),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_any_2xx_is_success() {
        let (_server, provider) = _setup_mock_server(
            201,
            json!({"choices": [{"message": {"role": "assistant", "content": "[]"}}]}),
        )
        .await;
        let (text, _) = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_slow_response_times_out_as_upstream() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "[]"}}]
                    }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let mut config = test_config(format!("{}/v1", mock_server.uri()));
        config.timeout_secs = 1;
        let provider = OpenAiProvider::new(config).unwrap();
        let result = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await;

        match result {
            Err(KgError::Upstream(message)) => assert!(message.contains("timed out")),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_upstream() {
        let server = MockServer::start().await;
        let host = format!("{}/v1", server.uri());
        drop(server);

        let provider = OpenAiProvider::new(test_config(host)).unwrap();
        let result = provider
            .complete(&[Message::user("hi")], &GenerationParams::default())
            .await;
        assert!(matches!(result, Err(KgError::Upstream(_))));
    }
}
