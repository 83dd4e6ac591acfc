//! Chat command handler.
//!
//! One question per line on stdin. A failed question is reported and the
//! session continues.

use clap::Args;
use pestkb_core::{config::AppConfig, AppResult};
use pestkb_knowledge::{PestKnowledgeRequest, PestKnowledgeService};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const GREETING: &str = "I am your AI pest control expert. What would you like to know?";

/// Interactive question/answer session on stdin
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Do not print the greeting or the input prompt marker
    #[arg(long)]
    pub quiet: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = PestKnowledgeService::from_config(config)?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        if !self.quiet {
            println!("{}", GREETING);
        }

        loop {
            if !self.quiet {
                print!("> ");
                std::io::stdout().flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query == "exit" || query == "quit" {
                break;
            }

            match service
                .pest_knowledge_retrieval(PestKnowledgeRequest {
                    query: query.to_string(),
                })
                .await
            {
                Ok(answer) => println!("{}\n", answer.response),
                Err(e) => {
                    tracing::error!("Question failed: {}", e);
                    eprintln!("error: {}\n", e);
                }
            }
        }

        Ok(())
    }
}
