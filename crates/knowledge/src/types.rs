//! Knowledge system type definitions.

use serde::{Deserialize, Deserializer, Serialize};

/// A knowledge-base document ranked by the retrieval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantDocument {
    /// File name within the knowledge base (e.g., "ants.md")
    pub filename: String,

    /// Document title (the file stem on the service side)
    #[serde(default)]
    pub title: String,

    /// Path of the document on the service host
    #[serde(default)]
    pub path: String,

    /// Similarity to the query, 0.0 - 1.0
    pub similarity_score: f64,

    /// Excerpt of the document content
    pub content: String,
}

/// Entities the retrieval service recognised in the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub pests: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub other_entities: Vec<String>,
}

/// Body of `POST /extract-context`.
///
/// Only `relevant_docs` drives context assembly; the rest is logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextExtractionResponse {
    #[serde(default)]
    pub entities: ExtractedEntities,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub original_query: String,

    /// Ordered most relevant first; `null` and missing both mean "none"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relevant_docs: Vec<RelevantDocument>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// Where an assembled context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextOrigin {
    /// Ranked excerpts from the retrieval service
    Retrieval,
    /// Retrieval succeeded but found nothing; the text is the sentinel
    NoMatches,
    /// Every markdown file in the knowledge-base directory
    Fallback,
}

/// Context text handed to the answering prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub text: String,
    pub origin: ContextOrigin,
    /// Number of documents or files that contributed to `text`
    pub document_count: usize,
}

/// Caller-facing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestKnowledgeRequest {
    pub query: String,
}

/// Caller-facing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub response: String,
}
