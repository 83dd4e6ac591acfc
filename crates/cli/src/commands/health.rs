//! Health command handler.

use clap::Args;
use pestkb_core::{config::AppConfig, AppResult};
use pestkb_knowledge::{load_markdown_files, RetrievalClient};
use serde_json::json;

/// Check the retrieval service and knowledge-base directory
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    /// The retrieval service being down is reported but not an error, since
    /// requests still succeed through the fallback. An unreadable knowledge
    /// directory is an error.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let retrieval = if config.retrieval.enabled {
            let client =
                RetrievalClient::new(&config.retrieval.endpoint, config.retrieval_timeout())?;
            match client.health().await {
                Ok(health) => json!({
                    "endpoint": client.base_url(),
                    "status": health.status,
                    "service": health.service,
                }),
                Err(e) => {
                    tracing::warn!("Retrieval service check failed: {}", e);
                    json!({
                        "endpoint": client.base_url(),
                        "status": "unavailable",
                        "error": e.to_string(),
                    })
                }
            }
        } else {
            json!({ "status": "disabled" })
        };

        let kb_dir = config.knowledge_dir();
        let files = load_markdown_files(&kb_dir)?;

        let report = json!({
            "retrieval": retrieval,
            "knowledgeBase": {
                "directory": kb_dir,
                "markdownFiles": files.len(),
            },
            "llm": {
                "provider": config.provider,
                "model": config.model,
            },
        });

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "retrieval:      {} ({})",
                report["retrieval"]["status"].as_str().unwrap_or("unknown"),
                config.retrieval.endpoint
            );
            println!("knowledge base: {} markdown files in {:?}", files.len(), kb_dir);
            println!("llm:            {} / {}", config.provider, config.model);
        }

        Ok(())
    }
}
