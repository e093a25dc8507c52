use serde_json::{json, Value};

use super::base::GenerationParams;
use crate::errors::{KgError, KgResult};
use crate::models::message::Message;

/// Convert messages to OpenAI's chat message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Build the chat completions request body
pub fn create_request(model: &str, messages: &[Message], params: &GenerationParams) -> Value {
    json!({
        "model": model,
        "messages": messages_to_openai_spec(messages),
        "temperature": params.temperature,
        "top_p": params.top_p,
        "max_tokens": params.max_tokens,
        "stream": false,
    })
}

/// Pull the assistant text out of a chat completions response
pub fn openai_response_to_text(response: &Value) -> KgResult<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| {
            KgError::Upstream(format!(
                "Response did not contain message content: {}",
                response
            ))
        })
}

#[derive(Debug, thiserror::Error)]
#[error("Input message too long. Message: {0}")]
pub struct InitialMessageTooLargeError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<InitialMessageTooLargeError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(InitialMessageTooLargeError(message))
    } else {
        None
    }
}
