//! Configuration management for the Tutor assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.tutor/config.yaml)
//!
//! The configuration is workspace-centric, with most state stored in `.tutor/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .tutor/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Model provider (e.g., "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for the model provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations
    pub llm: Option<LlmConfig>,

    /// Orchestrator settings
    pub assistant: AssistantConfig,

    /// Retrieval store settings
    pub retrieval: RetrievalConfig,
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
pub struct ProviderConfig {
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,
}

/// What the orchestrator does when one tool call in a round fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolFailurePolicy {
    /// Abandon the round and discard sibling results already gathered
    #[default]
    AbortRound,

    /// Report the failure as an error tool result and keep going
    BestEffort,
}

/// Settings for the multi-round conversation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Maximum tool-calling rounds before a forced tool-free answer
    #[serde(rename = "maxToolRounds", default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Sampling temperature for every model call
    #[serde(default)]
    pub temperature: f32,

    /// Token cap for every model call
    #[serde(rename = "maxTokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Prompt definition id for the system instructions
    #[serde(rename = "promptId", default)]
    pub prompt_id: Option<String>,

    /// Behaviour when a tool call fails mid-round
    #[serde(rename = "toolFailurePolicy", default)]
    pub tool_failure_policy: ToolFailurePolicy,
}

fn default_max_tool_rounds() -> u32 {
    2
}

fn default_max_tokens() -> u32 {
    800
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            prompt_id: None,
            tool_failure_policy: ToolFailurePolicy::default(),
        }
    }
}

/// Settings for the retrieval store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default hit count when a search names no explicit limit (zero is honoured)
    #[serde(rename = "maxResults", default = "default_max_results")]
    pub max_results: usize,

    /// Embedding vector dimension for the in-process collections
    #[serde(rename = "embeddingDim", default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Pre-chunked corpus to seed the store with
    #[serde(default)]
    pub corpus: Option<PathBuf>,
}

fn default_max_results() -> usize {
    5
}

fn default_embedding_dim() -> usize {
    384
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            embedding_dim: default_embedding_dim(),
            corpus: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    assistant: Option<AssistantConfig>,
    retrieval: Option<RetrievalConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

/// Providers the model factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["anthropic", "claude"];

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "anthropic".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
            llm: None,
            assistant: AssistantConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `TUTOR_WORKSPACE`: Override workspace path
    /// - `TUTOR_CONFIG`: Path to config file
    /// - `TUTOR_PROVIDER`: Model provider
    /// - `TUTOR_MODEL`: Model identifier
    /// - `TUTOR_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use tutor_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("TUTOR_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("TUTOR_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".tutor/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("TUTOR_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("TUTOR_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("TUTOR_API_KEY") {
            config.api_key = Some(key);
        }

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    /// Merge YAML text into a copy of this config.
    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = LogFormat::parse(&format);
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model.clone();
            }

            result.llm = Some(llm);
        }

        if let Some(assistant) = config_file.assistant {
            result.assistant = assistant;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .tutor directory.
    pub fn tutor_dir(&self) -> PathBuf {
        self.workspace.join(".tutor")
    }

    /// Ensure the .tutor directory exists.
    pub fn ensure_tutor_dir(&self) -> AppResult<()> {
        let tutor_dir = self.tutor_dir();
        if !tutor_dir.exists() {
            std::fs::create_dir_all(&tutor_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .tutor directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the corpus file, defaulting to `.tutor/corpus.yaml`.
    pub fn corpus_path(&self) -> PathBuf {
        match self.retrieval.corpus {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.tutor_dir().join("corpus.yaml"),
        }
    }

    /// Get a provider's configuration block, if one was loaded.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key: explicit key first, then the provider's env var,
    /// then `ANTHROPIC_API_KEY`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(provider_config) = self.get_provider_config(provider) {
            if let Ok(key) = std::env::var(&provider_config.api_key_env) {
                return Some(key);
            }
        }

        std::env::var("ANTHROPIC_API_KEY").ok()
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.resolve_api_key(&self.provider).is_none() {
            let env_var = self
                .get_provider_config(&self.provider)
                .map(|pc| pc.api_key_env.clone())
                .unwrap_or_else(|| "ANTHROPIC_API_KEY".to_string());
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        Ok(())
    }
}
