//! Prompt system for the pestkb assistant.
//!
//! This crate provides structured prompt management with:
//! - Built-in prompt definitions (the Arabic answering prompt)
//! - YAML overrides loaded from the workspace
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{answer_prompt, ANSWER_PROMPT_ID, KNOWLEDGE_BASE_VAR, QUERY_VAR};
pub use loader::load_prompt;
pub use types::{BuiltPrompt, PromptDefinition, PromptInputSpec, PromptOutputSpec};
