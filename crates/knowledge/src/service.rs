//! The caller-facing pest knowledge operation.

use crate::answer::AnswerGenerator;
use crate::assembler::ContextAssembler;
use crate::retrieval::RetrievalClient;
use crate::types::{AnswerResult, AssembledContext, PestKnowledgeRequest};
use pestkb_core::{AppConfig, AppError, AppResult};
use pestkb_llm::{create_client, LlmClient};
use pestkb_prompt::{load_prompt, ANSWER_PROMPT_ID};
use std::sync::Arc;
use tracing::Instrument;

/// Context assembly followed by answer generation.
///
/// Built once at startup and shared; holds no per-request state.
#[derive(Clone)]
pub struct PestKnowledgeService {
    assembler: ContextAssembler,
    generator: AnswerGenerator,
}

impl PestKnowledgeService {
    pub fn new(assembler: ContextAssembler, generator: AnswerGenerator) -> Self {
        Self {
            assembler,
            generator,
        }
    }

    /// Build the service from configuration, creating the LLM client.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let endpoint = config.provider_endpoint();
        let api_key = config.resolve_api_key(&config.provider);
        let llm = create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())?;

        Self::with_llm(config, llm)
    }

    /// Build the service from configuration with an existing LLM client.
    pub fn with_llm(config: &AppConfig, llm: Arc<dyn LlmClient>) -> AppResult<Self> {
        config.validate()?;

        let knowledge_dir = config.knowledge_dir();
        let assembler = if config.retrieval.enabled {
            let retrieval =
                RetrievalClient::new(&config.retrieval.endpoint, config.retrieval_timeout())?;
            ContextAssembler::new(retrieval, knowledge_dir)
        } else {
            ContextAssembler::directory_only(knowledge_dir)
        };

        let prompt = load_prompt(&config.workspace, ANSWER_PROMPT_ID)?;
        let generator = AnswerGenerator::new(llm, &config.model, prompt)
            .with_generation(config.generation.clone());

        tracing::debug!(
            "Pest knowledge service ready (provider: {}, model: {}, kb: {:?})",
            generator.provider_name(),
            generator.model(),
            assembler.knowledge_dir()
        );

        Ok(Self::new(assembler, generator))
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Answer a pest-control question from the knowledge base.
    ///
    /// An empty (or whitespace-only) query is rejected before any I/O.
    pub async fn pest_knowledge_retrieval(
        &self,
        request: PestKnowledgeRequest,
    ) -> AppResult<AnswerResult> {
        validate_query(&request.query)?;

        let span = tracing::info_span!("pest_knowledge", query_len = request.query.len());
        async {
            let context = self.assembler.assemble_context(&request.query).await?;
            tracing::info!(
                "Context ready ({:?}, {} documents)",
                context.origin,
                context.document_count
            );

            self.generator
                .generate_answer(&request.query, &context.text)
                .await
        }
        .instrument(span)
        .await
    }

    /// Assemble the context for a query without calling the LLM.
    pub async fn assemble_context(&self, query: &str) -> AppResult<AssembledContext> {
        validate_query(query)?;
        self.assembler.assemble_context(query).await
    }
}

fn validate_query(query: &str) -> AppResult<()> {
    if query.trim().is_empty() {
        return Err(AppError::Validation("query must not be empty".to_string()));
    }
    Ok(())
}
