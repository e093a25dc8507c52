use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::errors::{KgError, KgResult};
use crate::models::message::Message;
use crate::providers::base::{GenerationParams, Provider, Usage};

/// A mock provider that returns pre-configured responses and records every conversation it saw
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of raw text responses
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(|r| Ok(r.into())).collect(),
            )),
            calls: Arc::default(),
        }
    }

    /// Queue an upstream failure after the already queued responses
    pub fn then_fail<S: Into<String>>(self, message: S) -> Self {
        self.responses.lock().unwrap().push(Err(message.into()));
        self
    }

    /// Conversations received so far, in call order
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> KgResult<(String, Usage)> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // An empty array once the script runs out
            Ok(("[]".to_string(), Usage::default()))
        } else {
            match responses.remove(0) {
                Ok(text) => Ok((text, Usage::default())),
                Err(message) => Err(KgError::Upstream(message)),
            }
        }
    }
}
