//! Context command handler.
//!
//! Shows exactly what the answering prompt would receive for a query,
//! without calling the LLM.

use clap::Args;
use pestkb_core::{config::AppConfig, AppResult};
use pestkb_knowledge::PestKnowledgeService;

/// Print the context that would be sent to the LLM
#[derive(Args, Debug)]
pub struct ContextCommand {
    /// The question to assemble context for
    pub query: String,

    /// Print the fully rendered prompt instead of the bare context
    #[arg(long, conflicts_with = "json")]
    pub prompt: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ContextCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = PestKnowledgeService::from_config(config)?;
        let context = service.assemble_context(&self.query).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&context)?);
        } else if self.prompt {
            let built = service
                .generator()
                .build_answer_prompt(&self.query, &context.text)?;
            println!("{}", built.user);
        } else {
            eprintln!(
                "[{:?}: {} documents, {} bytes]",
                context.origin,
                context.document_count,
                context.text.len()
            );
            println!("{}", context.text);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        context: ContextCommand,
    }

    #[test]
    fn test_prompt_and_json_conflict() {
        let result = TestCli::try_parse_from(["pestkb", "ants", "--prompt", "--json"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_prompt_alone_parses() {
        let cli = TestCli::try_parse_from(["pestkb", "ants", "--prompt"]).unwrap();
        assert!(cli.context.prompt);
        assert!(!cli.context.json);
        assert_eq!(cli.context.query, "ants");
    }
}
