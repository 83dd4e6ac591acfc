//! Ask command handler.

use clap::Args;
use pestkb_core::{config::AppConfig, AppError, AppResult};
use pestkb_knowledge::{PestKnowledgeRequest, PestKnowledgeService};
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Output as JSON (`{"response": ...}`)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let query = self.get_query()?;
        tracing::debug!("Question: {}", query);

        let service = PestKnowledgeService::from_config(config)?;
        let answer = service
            .pest_knowledge_retrieval(PestKnowledgeRequest { query })
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.response);
        }

        Ok(())
    }

    fn get_query(&self) -> AppResult<String> {
        if let Some(ref query) = self.query {
            return Ok(query.clone());
        }

        match self.file {
            Some(ref path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Validation(format!("Failed to read question file {:?}: {}", path, e))
            }),
            None => Err(AppError::Validation("No question provided".to_string())),
        }
    }
}
