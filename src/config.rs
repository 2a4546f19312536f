//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesinsight.toml` files. Prompt templates live here too, so the
//! wording of every stage can be changed without touching code.

use crate::prompts::{defaults, PromptBuilder};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".salesinsight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline behavior.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Query responder settings.
    #[serde(default)]
    pub query: QueryConfig,

    /// Prompt templates and options.
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Email envelope settings.
    #[serde(default)]
    pub email: EmailConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Show a spinner while each stage runs.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            show_progress: true,
        }
    }
}

/// Dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the sales CSV.
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> String {
    "company_sales.csv".to_string()
}

/// Which completion API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI-compatible chat completions (Groq, OpenAI, vLLM, ...)
    #[default]
    Openai,
    /// Ollama `/api/chat`
    Ollama,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Openai => "openai",
            BackendKind::Ollama => "ollama",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Completion backend.
    #[serde(default)]
    pub backend: BackendKind,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Prefer `api_key_env` over storing keys in the file.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            name: default_model(),
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl ModelConfig {
    /// The API key from the config, or from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    120
}

/// What the coordinator does after a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Thread the failure text into the next stage as if it were content.
    #[default]
    Continue,
    /// Mark the remaining stages as skipped without calling the backend.
    Halt,
}

/// Pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub on_stage_error: ErrorPolicy,
}

/// How much of the dataset a query prompt carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatasetContext {
    /// Every row is serialized into the prompt.
    #[default]
    Full,
    /// Aggregates plus the first `sample_rows` rows.
    Summary,
}

/// Query responder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub dataset_context: DatasetContext,

    /// Rows included in `summary` mode.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dataset_context: DatasetContext::default(),
            sample_rows: default_sample_rows(),
        }
    }
}

fn default_sample_rows() -> usize {
    5
}

/// Prompt options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Number of bullets the summarizer is asked for.
    #[serde(default = "default_bullet_count")]
    pub bullet_count: usize,

    /// Insight categories requested from the analyst, in order.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    /// Areas the strategist must cover, in order.
    #[serde(default = "default_strategy_focus")]
    pub strategy_focus: Vec<String>,

    #[serde(default)]
    pub templates: TemplateConfig,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            bullet_count: default_bullet_count(),
            sections: default_sections(),
            strategy_focus: default_strategy_focus(),
            templates: TemplateConfig::default(),
        }
    }
}

fn default_bullet_count() -> usize {
    defaults::BULLET_COUNT
}

fn default_sections() -> Vec<String> {
    defaults::SECTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_strategy_focus() -> Vec<String> {
    defaults::STRATEGY_FOCUS.iter().map(|s| s.to_string()).collect()
}

/// Template text for each prompt. See [`crate::prompts`] for slot names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_analyst_template")]
    pub analyst: String,

    #[serde(default = "default_summarizer_template")]
    pub summarizer: String,

    #[serde(default = "default_strategist_template")]
    pub strategist: String,

    #[serde(default = "default_email_template")]
    pub email: String,

    #[serde(default = "default_query_template")]
    pub query: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            analyst: default_analyst_template(),
            summarizer: default_summarizer_template(),
            strategist: default_strategist_template(),
            email: default_email_template(),
            query: default_query_template(),
        }
    }
}

fn default_analyst_template() -> String {
    defaults::ANALYST_TEMPLATE.to_string()
}

fn default_summarizer_template() -> String {
    defaults::SUMMARIZER_TEMPLATE.to_string()
}

fn default_strategist_template() -> String {
    defaults::STRATEGIST_TEMPLATE.to_string()
}

fn default_email_template() -> String {
    defaults::EMAIL_TEMPLATE.to_string()
}

fn default_query_template() -> String {
    defaults::QUERY_TEMPLATE.to_string()
}

/// Email envelope settings. The envelope is displayed, never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Subject line; the report month is appended.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Footer line identifying the generator.
    #[serde(default = "default_signature")]
    pub signature: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            recipient: default_recipient(),
            subject: default_subject(),
            signature: default_signature(),
        }
    }
}

fn default_sender() -> String {
    "analytics@example.com".to_string()
}

fn default_recipient() -> String {
    "boss@example.com".to_string()
}

fn default_subject() -> String {
    "Monthly Sales Performance Report".to_string()
}

fn default_signature() -> String {
    "Generated by Sales Insight".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(backend) = args.backend {
            self.model.backend = backend;
        }
        if let Some(ref base_url) = args.base_url {
            self.model.base_url = base_url.clone();
        }
        if let Some(ref api_key) = args.api_key {
            self.model.api_key = Some(api_key.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(context) = args.query_context {
            self.query.dataset_context = context;
        }

        if args.halt_on_error {
            self.pipeline.on_stage_error = ErrorPolicy::Halt;
        }
        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet {
            self.general.show_progress = false;
        }
    }

    /// Check values that serde cannot, including that all templates compile.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            bail!("Temperature must be between 0.0 and 2.0");
        }
        if self.model.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if !self.model.base_url.starts_with("http://") && !self.model.base_url.starts_with("https://") {
            bail!("Base URL must start with 'http://' or 'https://'");
        }
        if self.prompts.bullet_count == 0 {
            bail!("prompts.bullet_count must be at least 1");
        }

        PromptBuilder::new(&self.prompts, &self.query).context("Invalid prompt template")?;
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
