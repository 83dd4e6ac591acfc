//! Context assembly.
//!
//! Turns a query into the knowledge-base text the answering prompt sees:
//! ranked excerpts from the retrieval service when it answers, the whole
//! markdown directory when it does not.

use crate::fallback::{format_knowledge_files, load_markdown_files};
use crate::retrieval::{RetrievalClient, RetrievalError};
use crate::types::{AssembledContext, ContextExtractionResponse, ContextOrigin, RelevantDocument};
use pestkb_core::AppResult;
use std::path::{Path, PathBuf};

/// Context used when nothing relevant exists. The prompt never receives an
/// empty knowledge base.
pub const NO_INFORMATION_SENTINEL: &str =
    "لا توجد معلومات متاحة في قاعدة المعرفة حول هذا الموضوع.";

/// Builds the knowledge-base context for a query.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    retrieval: Option<RetrievalClient>,
    knowledge_dir: PathBuf,
}

impl ContextAssembler {
    /// Use the retrieval service first, `knowledge_dir` as the fallback.
    pub fn new(retrieval: RetrievalClient, knowledge_dir: impl Into<PathBuf>) -> Self {
        Self {
            retrieval: Some(retrieval),
            knowledge_dir: knowledge_dir.into(),
        }
    }

    /// Skip the retrieval service and always load the whole directory.
    pub fn directory_only(knowledge_dir: impl Into<PathBuf>) -> Self {
        Self {
            retrieval: None,
            knowledge_dir: knowledge_dir.into(),
        }
    }

    pub fn retrieval(&self) -> Option<&RetrievalClient> {
        self.retrieval.as_ref()
    }

    pub fn knowledge_dir(&self) -> &Path {
        &self.knowledge_dir
    }

    /// Assemble the context for `query`.
    ///
    /// Retrieval failures of every kind fall back to the directory; only a
    /// failure to read the directory is returned as an error.
    pub async fn assemble_context(&self, query: &str) -> AppResult<AssembledContext> {
        let Some(ref retrieval) = self.retrieval else {
            tracing::debug!("Retrieval disabled, loading full knowledge base");
            return self.full_knowledge_base();
        };

        match retrieval.extract_context(query).await {
            Ok(response) => Ok(context_from_response(&response)),
            Err(err) => {
                log_retrieval_failure(&err);
                tracing::warn!("Falling back to full knowledge base loading");
                self.full_knowledge_base()
            }
        }
    }

    /// Load and concatenate every markdown file in the knowledge directory.
    pub fn full_knowledge_base(&self) -> AppResult<AssembledContext> {
        let files = load_markdown_files(&self.knowledge_dir)?;

        if files.is_empty() {
            tracing::warn!(
                "Knowledge base directory {:?} contains no markdown files",
                self.knowledge_dir
            );
            return Ok(AssembledContext {
                text: NO_INFORMATION_SENTINEL.to_string(),
                origin: ContextOrigin::Fallback,
                document_count: 0,
            });
        }

        let text = format_knowledge_files(&files);
        tracing::info!(
            "Loaded full knowledge base: {} files, {} bytes",
            files.len(),
            text.len()
        );

        Ok(AssembledContext {
            text,
            origin: ContextOrigin::Fallback,
            document_count: files.len(),
        })
    }
}

fn context_from_response(response: &ContextExtractionResponse) -> AssembledContext {
    tracing::debug!(
        "Retrieval keywords: {:?}, pests: {:?}",
        response.keywords,
        response.entities.pests
    );

    if response.relevant_docs.is_empty() {
        tracing::info!("Retrieval service found no relevant documents");
        return AssembledContext {
            text: NO_INFORMATION_SENTINEL.to_string(),
            origin: ContextOrigin::NoMatches,
            document_count: 0,
        };
    }

    let text = format_relevant_docs(&response.relevant_docs);
    tracing::info!(
        "Assembled context from {} relevant documents ({} bytes)",
        response.relevant_docs.len(),
        text.len()
    );

    AssembledContext {
        text,
        origin: ContextOrigin::Retrieval,
        document_count: response.relevant_docs.len(),
    }
}

fn log_retrieval_failure(err: &RetrievalError) {
    if err.is_unavailable() {
        tracing::warn!("Retrieval service unavailable: {}", err);
    } else {
        // The service answered but with a body we cannot use; likely a bug
        // on its side, so make it loud.
        tracing::error!("Retrieval service returned an unusable response: {}", err);
    }
}

/// Render ranked documents in the order received.
///
/// Each block is a `--- FILE: name (title) - Relevance Score: 0.00 ---`
/// header followed by the document content.
pub fn format_relevant_docs(docs: &[RelevantDocument]) -> String {
    let mut content = String::new();
    for doc in docs {
        content.push_str(&format!(
            "\n\n--- FILE: {} ({}) - Relevance Score: {:.2} ---\n\n",
            doc.filename, doc.title, doc.similarity_score
        ));
        content.push_str(&doc.content);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use pestkb_core::AppError;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn doc(filename: &str, title: &str, score: f64, content: &str) -> RelevantDocument {
        RelevantDocument {
            filename: filename.to_string(),
            title: title.to_string(),
            path: format!("/kb/{}", filename),
            similarity_score: score,
            content: content.to_string(),
        }
    }

    fn kb_with_two_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.md"), "ants content").unwrap();
        fs::write(temp.path().join("b.md"), "bees content").unwrap();
        temp
    }

    #[test]
    fn test_format_keeps_order_and_two_decimals() {
        let docs = vec![
            doc("termites.md", "Termites", 0.873, "wood damage"),
            doc("ants.md", "Ants", 0.9, "trails"),
        ];

        let text = format_relevant_docs(&docs);

        assert_eq!(
            text,
            "\n\n--- FILE: termites.md (Termites) - Relevance Score: 0.87 ---\n\nwood damage\
             \n\n--- FILE: ants.md (Ants) - Relevance Score: 0.90 ---\n\ntrails"
        );
    }

    #[test]
    fn test_empty_docs_yield_sentinel() {
        let context = context_from_response(&ContextExtractionResponse::default());
        assert_eq!(context.text, NO_INFORMATION_SENTINEL);
        assert_eq!(context.origin, ContextOrigin::NoMatches);
        assert!(!context.text.is_empty());
    }

    #[tokio::test]
    async fn test_directory_only_skips_retrieval() {
        let kb = kb_with_two_files();
        let assembler = ContextAssembler::directory_only(kb.path());

        let context = assembler.assemble_context("anything").await.unwrap();

        assert_eq!(context.origin, ContextOrigin::Fallback);
        assert_eq!(context.document_count, 2);
        assert!(context.text.contains("--- FILE: a.md ---"));
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let kb = kb_with_two_files();
        let retrieval = RetrievalClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let assembler = ContextAssembler::new(retrieval, kb.path());

        let context = assembler.assemble_context("ants").await.unwrap();

        assert_eq!(context.origin, ContextOrigin::Fallback);
        assert!(context.text.contains("ants content"));
        assert!(context.text.contains("bees content"));
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"relevant_docs\": 7}"))
            .mount(&server)
            .await;

        let kb = kb_with_two_files();
        let retrieval = RetrievalClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let assembler = ContextAssembler::new(retrieval, kb.path());

        let context = assembler.assemble_context("ants").await.unwrap();
        assert_eq!(context.origin, ContextOrigin::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_read_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let retrieval =
            RetrievalClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let assembler = ContextAssembler::new(retrieval, temp.path().join("missing"));

        let result = assembler.assemble_context("ants").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_directory_yields_sentinel() {
        let temp = TempDir::new().unwrap();
        let context = ContextAssembler::directory_only(temp.path())
            .full_knowledge_base()
            .unwrap();
        assert_eq!(context.text, NO_INFORMATION_SENTINEL);
        assert_eq!(context.document_count, 0);
    }

    #[test]
    fn test_kb_path_pointing_at_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("ants.md");
        fs::write(&file, "# Ants").unwrap();

        let result = ContextAssembler::directory_only(file).full_knowledge_base();
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }
}
