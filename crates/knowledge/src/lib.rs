//! Pest-control knowledge base.
//!
//! Context assembly (retrieval service with whole-directory fallback) and
//! Arabic answer generation, exposed through [`PestKnowledgeService`].
//!
//! # Example
//! ```no_run
//! use pestkb_core::AppConfig;
//! use pestkb_knowledge::{PestKnowledgeRequest, PestKnowledgeService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let service = PestKnowledgeService::from_config(&config)?;
//! let answer = service
//!     .pest_knowledge_retrieval(PestKnowledgeRequest {
//!         query: "How do I get rid of ants?".to_string(),
//!     })
//!     .await?;
//! println!("{}", answer.response);
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod assembler;
pub mod fallback;
pub mod retrieval;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use answer::AnswerGenerator;
pub use assembler::{format_relevant_docs, ContextAssembler, NO_INFORMATION_SENTINEL};
pub use fallback::{load_markdown_files, KnowledgeFile};
pub use retrieval::{RetrievalClient, RetrievalError};
pub use service::PestKnowledgeService;
pub use types::{
    AnswerResult, AssembledContext, ContextExtractionResponse, ContextOrigin, ExtractedEntities,
    PestKnowledgeRequest, RelevantDocument, ServiceHealth,
};
