//! Scripted LLM client for tests and offline development.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use pestkb_core::{AppError, AppResult};
use std::sync::Mutex;

/// Mock provider returning a fixed reply and recording every request.
#[derive(Debug)]
pub struct MockLlmClient {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Always answer with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with `AppError::Llm(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }

        match self.reply {
            Ok(ref content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Err(ref message) => Err(AppError::Llm(message.clone())),
        }
    }
}
