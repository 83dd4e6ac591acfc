//! pestkb CLI
//!
//! Main entry point for the pest-control knowledge-base assistant.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ContextCommand, HealthCommand, ServeCommand};
use pestkb_core::config::{AppConfig, ConfigOverrides};
use pestkb_core::{logging, AppResult};
use std::path::PathBuf;

/// pestkb - pest-control knowledge-base assistant answering in Arabic
#[derive(Parser, Debug)]
#[command(name = "pestkb")]
#[command(about = "Pest-control knowledge-base assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PESTKB_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PESTKB_CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge-base directory holding *.md files
    #[arg(long, global = true)]
    kb_dir: Option<PathBuf>,

    /// Retrieval service base URL
    #[arg(long, global = true)]
    retrieval_url: Option<String>,

    /// Retrieval timeout in milliseconds
    #[arg(long, global = true)]
    retrieval_timeout_ms: Option<u64>,

    /// Skip the retrieval service and always send the whole knowledge base
    #[arg(long, global = true)]
    no_retrieval: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Maximum tokens to generate
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Print the context that would be sent to the LLM
    Context(ContextCommand),

    /// Check the retrieval service and knowledge-base directory
    Health(HealthCommand),

    /// Interactive question/answer session on stdin
    Chat(ChatCommand),

    /// Serve the question endpoint over HTTP
    Serve(ServeCommand),
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            workspace: self.workspace.clone(),
            config_file: self.config.clone(),
            knowledge_dir: self.kb_dir.clone(),
            retrieval_endpoint: self.retrieval_url.clone(),
            retrieval_timeout_ms: self.retrieval_timeout_ms,
            no_retrieval: self.no_retrieval,
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            log_level: self.log_level.clone(),
            verbose: self.verbose,
            no_color: self.no_color,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(&cli.overrides())?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Knowledge base: {:?}", config.knowledge_dir());
    tracing::debug!("Provider: {} / {}", config.provider, config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Context(_) => "context",
        Commands::Health(_) => "health",
        Commands::Chat(_) => "chat",
        Commands::Serve(_) => "serve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Context(cmd) => cmd.execute(&config).await,
        Commands::Health(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
