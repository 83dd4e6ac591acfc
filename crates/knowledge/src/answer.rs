//! Answer generation.
//!
//! Renders the answering prompt around the assembled context and hands it
//! to the LLM. The LLM output is returned untouched.

use crate::types::AnswerResult;
use pestkb_core::{AppError, AppResult, GenerationConfig};
use pestkb_llm::{LlmClient, LlmRequest};
use pestkb_prompt::{build_prompt, BuiltPrompt, PromptDefinition, KNOWLEDGE_BASE_VAR, QUERY_VAR};
use std::collections::HashMap;
use std::sync::Arc;

/// Generates Arabic answers from a context and a query.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    generation: GenerationConfig,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
            generation: GenerationConfig::default(),
        }
    }

    /// Sampling settings applied to every answer request.
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.llm.provider_name()
    }

    /// Render the answering prompt with `query` and `context` inserted verbatim.
    pub fn build_answer_prompt(&self, query: &str, context: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert(QUERY_VAR.to_string(), query.to_string());
        variables.insert(KNOWLEDGE_BASE_VAR.to_string(), context.to_string());

        build_prompt(&self.prompt, variables)
    }

    /// Ask the LLM. Provider failures and empty output are both errors;
    /// there is no retry.
    pub async fn generate_answer(&self, query: &str, context: &str) -> AppResult<AnswerResult> {
        let built = self.build_answer_prompt(query, context)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(temperature) = self.generation.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.generation.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            "Sending prompt {} ({} bytes) to {}",
            built.source_prompt_id,
            request.prompt.len(),
            self.llm.provider_name()
        );

        let response = self.llm.complete(&request).await?;

        if response.content.trim().is_empty() {
            return Err(AppError::Llm("LLM returned no output".to_string()));
        }

        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );

        Ok(AnswerResult {
            response: response.content,
        })
    }
}
