//! Configuration management for the pestkb assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.pestkb/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The knowledge-base directory, the retrieval service,
//! and the LLM provider are all resolved here so the rest of the workspace
//! receives a fully merged `AppConfig`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default retrieval service base URL.
pub const DEFAULT_RETRIEVAL_ENDPOINT: &str = "http://localhost:5000";

/// Default bound on the retrieval call, in milliseconds.
pub const DEFAULT_RETRIEVAL_TIMEOUT_MS: u64 = 10_000;

/// Providers `create_client` knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .pestkb/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit knowledge-base directory; defaults to `<workspace>/kb`
    pub knowledge_dir: Option<PathBuf>,

    /// Retrieval service settings
    pub retrieval: RetrievalConfig,

    /// Sampling settings for answer generation
    pub generation: GenerationConfig,

    /// Active LLM provider ("ollama", "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,
}

/// Retrieval (context-extraction) service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL; `/extract-context` and `/health` are appended
    pub endpoint: String,

    /// Upper bound on a single extraction call
    #[serde(rename = "timeoutMs")]
    pub timeout_ms: u64,

    /// When false, context always comes from the knowledge-base directory
    pub enabled: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RETRIEVAL_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_RETRIEVAL_TIMEOUT_MS,
            enabled: true,
        }
    }
}

/// Sampling settings passed to the LLM with every answer request.
///
/// Unset values leave the provider's own defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,

    #[serde(rename = "maxTokens")]
    pub max_tokens: Option<u32>,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    knowledge: Option<KnowledgeSection>,
    retrieval: Option<RetrievalSection>,
    generation: Option<GenerationConfig>,
    llm: Option<LlmConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KnowledgeSection {
    directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    endpoint: Option<String>,
    #[serde(rename = "timeoutMs")]
    timeout_ms: Option<u64>,
    enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub knowledge_dir: Option<PathBuf>,
    pub retrieval_endpoint: Option<String>,
    pub retrieval_timeout_ms: Option<u64>,
    pub no_retrieval: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            knowledge_dir: None,
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `PESTKB_WORKSPACE`: Override workspace path
    /// - `PESTKB_CONFIG`: Path to config file
    /// - `PESTKB_KB_DIR`: Knowledge-base directory
    /// - `PESTKB_RETRIEVAL_URL`: Retrieval service base URL
    /// - `PESTKB_RETRIEVAL_TIMEOUT_MS`: Retrieval timeout in milliseconds
    /// - `PESTKB_PROVIDER`: LLM provider
    /// - `PESTKB_MODEL`: Model identifier
    /// - `PESTKB_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use pestkb_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Knowledge base: {:?}", config.knowledge_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(&ConfigOverrides::default())
    }

    /// Load configuration, honoring workspace/config-file overrides before
    /// the YAML file is located, then applying the remaining overrides.
    pub fn load_with(overrides: &ConfigOverrides) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("PESTKB_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(ref workspace) = overrides.workspace {
            config.workspace = workspace.clone();
        }

        if let Ok(config_file) = std::env::var("PESTKB_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(ref config_file) = overrides.config_file {
            config.config_file = Some(config_file.clone());
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.pestkb_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env()?;

        Ok(config.with_overrides(overrides.clone()))
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(dir) = std::env::var("PESTKB_KB_DIR") {
            self.knowledge_dir = Some(PathBuf::from(dir));
        }

        if let Ok(endpoint) = std::env::var("PESTKB_RETRIEVAL_URL") {
            self.retrieval.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("PESTKB_RETRIEVAL_TIMEOUT_MS") {
            self.retrieval.timeout_ms = timeout.parse().map_err(|e| {
                AppError::Config(format!(
                    "Invalid PESTKB_RETRIEVAL_TIMEOUT_MS '{}': {}",
                    timeout, e
                ))
            })?;
        }

        if let Ok(provider) = std::env::var("PESTKB_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("PESTKB_MODEL") {
            self.model = model;
        }

        if let Ok(key) = std::env::var("PESTKB_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(dir) = config_file.knowledge.and_then(|kb| kb.directory) {
            result.knowledge_dir = Some(PathBuf::from(dir));
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(endpoint) = retrieval.endpoint {
                result.retrieval.endpoint = endpoint;
            }
            if let Some(timeout_ms) = retrieval.timeout_ms {
                result.retrieval.timeout_ms = timeout_ms;
            }
            if let Some(enabled) = retrieval.enabled {
                result.retrieval.enabled = enabled;
            }
        }

        if let Some(generation) = config_file.generation {
            if generation.temperature.is_some() {
                result.generation.temperature = generation.temperature;
            }
            if generation.max_tokens.is_some() {
                result.generation.max_tokens = generation.max_tokens;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(dir) = overrides.knowledge_dir {
            self.knowledge_dir = Some(dir);
        }

        if let Some(endpoint) = overrides.retrieval_endpoint {
            self.retrieval.endpoint = endpoint;
        }

        if let Some(timeout_ms) = overrides.retrieval_timeout_ms {
            self.retrieval.timeout_ms = timeout_ms;
        }

        if overrides.no_retrieval {
            self.retrieval.enabled = false;
        }

        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.model = model;
        }

        if let Some(temperature) = overrides.temperature {
            self.generation.temperature = Some(temperature);
        }

        if let Some(max_tokens) = overrides.max_tokens {
            self.generation.max_tokens = Some(max_tokens);
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .pestkb directory.
    pub fn pestkb_dir(&self) -> PathBuf {
        self.workspace.join(".pestkb")
    }

    /// Directory holding the markdown knowledge base.
    ///
    /// Relative paths are resolved against the workspace.
    pub fn knowledge_dir(&self) -> PathBuf {
        match self.knowledge_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.workspace.join("kb"),
        }
    }

    /// Retrieval timeout as a `Duration`.
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval.timeout_ms)
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Endpoint for the active provider, if configured.
    pub fn provider_endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint().map(str::to_string))
    }

    /// Resolve the API key for a provider.
    ///
    /// `PESTKB_API_KEY` wins over the provider's `apiKeyEnv` variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate configuration for the active provider and retrieval service.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(&provider).is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires an API key (PESTKB_API_KEY or apiKeyEnv)".to_string(),
            ));
        }

        if let Some(temperature) = self.generation.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::Config(format!(
                    "Temperature must be between 0.0 and 2.0: {}",
                    temperature
                )));
            }
        }

        if self.generation.max_tokens == Some(0) {
            return Err(AppError::Config(
                "maxTokens must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.enabled {
            if self.retrieval.timeout_ms == 0 {
                return Err(AppError::Config(
                    "Retrieval timeout must be greater than zero".to_string(),
                ));
            }

            if !self.retrieval.endpoint.starts_with("http://")
                && !self.retrieval.endpoint.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "Retrieval endpoint must be an http(s) URL: {}",
                    self.retrieval.endpoint
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.retrieval.endpoint, "http://localhost:5000");
        assert_eq!(config.retrieval_timeout(), Duration::from_secs(10));
        assert!(config.retrieval.enabled);
        assert!(!config.verbose);
    }

    #[test]
    fn test_knowledge_dir_resolution() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/pestkb");
        assert_eq!(config.knowledge_dir(), PathBuf::from("/srv/pestkb/kb"));

        config.knowledge_dir = Some(PathBuf::from("src/kb"));
        assert_eq!(config.knowledge_dir(), PathBuf::from("/srv/pestkb/src/kb"));

        config.knowledge_dir = Some(PathBuf::from("/data/kb"));
        assert_eq!(config.knowledge_dir(), PathBuf::from("/data/kb"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            provider: Some("openai".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            retrieval_timeout_ms: Some(2500),
            no_retrieval: true,
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.retrieval.timeout_ms, 2500);
        assert!(!config.retrieval.enabled);
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
knowledge:
  directory: src/kb
retrieval:
  endpoint: http://nlp:5000
  timeoutMs: 3000
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: qwen2.5
generation:
  temperature: 0.2
  maxTokens: 800
logging:
  level: warn
  color: false
"#;

        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.knowledge_dir, Some(PathBuf::from("src/kb")));
        assert_eq!(merged.retrieval.endpoint, "http://nlp:5000");
        assert_eq!(merged.retrieval.timeout_ms, 3000);
        assert!(merged.retrieval.enabled);
        assert_eq!(merged.model, "qwen2.5");
        assert_eq!(
            merged.provider_endpoint(),
            Some("http://gpu-box:11434".to_string())
        );
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert_eq!(
            merged.generation,
            GenerationConfig {
                temperature: Some(0.2),
                max_tokens: Some(800),
            }
        );
    }

    #[test]
    fn test_generation_overrides_win_over_file() {
        let merged = AppConfig::default()
            .merge_yaml_str("generation:\n  temperature: 0.9\n  maxTokens: 400\n")
            .unwrap()
            .with_overrides(ConfigOverrides {
                temperature: Some(0.1),
                ..Default::default()
            });

        assert_eq!(merged.generation.temperature, Some(0.1));
        assert_eq!(merged.generation.max_tokens, Some(400));
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_validate_generation_bounds() {
        let mut config = AppConfig::default();
        config.generation.temperature = Some(2.5);
        assert!(config.validate().is_err());

        config.generation.temperature = Some(0.0);
        config.generation.max_tokens = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_openai_provider_config_parses() {
        let yaml = r#"
llm:
  activeProvider: openai
  providers:
    openai:
      apiKeyEnv: PESTKB_TEST_UNSET_OPENAI_KEY
      model: gpt-4o-mini
"#;

        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.provider, "openai");
        assert!(matches!(
            merged.get_provider_config("openai"),
            Some(ProviderConfig::OpenAI { .. })
        ));
        assert!(merged.validate().is_err());
    }

    #[test]
    fn test_load_reads_workspace_config_file() {
        let temp = TempDir::new().unwrap();
        let pestkb_dir = temp.path().join(".pestkb");
        std::fs::create_dir_all(&pestkb_dir).unwrap();
        std::fs::write(
            pestkb_dir.join("config.yaml"),
            "retrieval:\n  enabled: false\n",
        )
        .unwrap();

        let config = AppConfig::load_with(&ConfigOverrides {
            workspace: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        assert!(!config.retrieval.enabled);
        assert_eq!(config.knowledge_dir(), temp.path().join("kb"));
    }

    #[test]
    fn test_load_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(&ConfigOverrides {
            workspace: Some(temp.path().to_path_buf()),
            config_file: Some(temp.path().join("nope.yaml")),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.retrieval.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.retrieval.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
