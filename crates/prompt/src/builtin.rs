//! Prompts compiled into the binary.
//!
//! A workspace can override any of these by placing a YAML definition with
//! the same id under `.pestkb/prompts/`.

use crate::types::{PromptDefinition, PromptInputSpec, PromptOutputSpec};

/// Id of the knowledge-base answering prompt.
pub const ANSWER_PROMPT_ID: &str = "pest.knowledge.answer";

/// Template variable carrying the assembled knowledge-base context.
pub const KNOWLEDGE_BASE_VAR: &str = "knowledgeBase";

/// Template variable carrying the user's question.
pub const QUERY_VAR: &str = "query";

const ANSWER_TEMPLATE: &str = "You are a pest control expert assistant. Answer ONLY from the knowledge base provided below. Do not use any outside knowledge.

If the answer is not found in the knowledge base, you MUST state that you do not have the information.
The user may ask in any language, but you MUST respond in Arabic.

Knowledge Base (with relevance scores):
{{{knowledgeBase}}}

---

User Query: {{{query}}}
";

/// Look up a built-in prompt by id.
pub fn builtin_prompt(id: &str) -> Option<PromptDefinition> {
    match id {
        ANSWER_PROMPT_ID => Some(answer_prompt()),
        _ => None,
    }
}

/// The knowledge-base answering prompt.
pub fn answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Pest control knowledge-base answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "pestkb".to_string(),
        input: PromptInputSpec {
            variables: vec![KNOWLEDGE_BASE_VAR.to_string(), QUERY_VAR.to_string()],
        },
        template: ANSWER_TEMPLATE.to_string(),
        output: PromptOutputSpec::default(),
    }
}
