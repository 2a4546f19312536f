//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::{BackendKind, DatasetContext};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sales Insight - LLM-generated insights for sales data
///
/// Loads a sales CSV, computes summary statistics, and runs a staged
/// analyst / summarizer / strategist / email pipeline against an
/// OpenAI-compatible or Ollama completion backend.
///
/// Examples:
///   sales-insight
///   sales-insight analyze --output report.md
///   sales-insight ask "Which product had the best margin?"
///   sales-insight --backend ollama --base-url http://localhost:11434 --model llama3.2 overview
///   sales-insight probe
///   sales-insight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Sales CSV to analyze
    ///
    /// Defaults to data.path from the config file (company_sales.csv).
    #[arg(short, long, value_name = "FILE", global = true)]
    pub data: Option<PathBuf>,

    /// Model name passed to the completion backend
    #[arg(short, long, env = "SALES_INSIGHT_MODEL", global = true)]
    pub model: Option<String>,

    /// Completion backend (openai, ollama)
    #[arg(long, value_name = "BACKEND", global = true)]
    pub backend: Option<BackendKind>,

    /// Backend base URL
    ///
    /// e.g. https://api.groq.com/openai/v1 or http://localhost:11434
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// API key for OpenAI-compatible backends
    #[arg(long, env = "SALES_INSIGHT_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Timeout for each completion call in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// How much of the dataset question prompts carry (full, summary)
    #[arg(long, value_name = "MODE", global = true)]
    pub query_context: Option<DatasetContext>,

    /// Skip the remaining stages after the first failed one
    #[arg(long, global = true)]
    pub halt_on_error: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesinsight.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinners)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .salesinsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// What to do with the loaded dataset.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Prompt for 'analyze', 'ask <question>', or 'quit' (default)
    Interactive,

    /// Run the full pipeline and print the results
    Analyze {
        /// Also save a report to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Answer one question about the dataset, or list sample questions
    /// when none is given
    Ask {
        /// The question; multiple words are joined with spaces
        #[arg(num_args = 0..)]
        question: Vec<String>,
    },

    /// Print key metrics and tables without calling the backend
    Overview,

    /// Run the pipeline and print the email envelope
    Email,

    /// Send a short prompt to each model and report the first that works
    Probe {
        /// Candidate models, tried in order
        models: Vec<String>,
    },
}

/// Output format for saved reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The selected command, defaulting to the interactive loop.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Interactive)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level. `--quiet` wins over both `--verbose` and
    /// `general.verbose` from the config file.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: None,
            data: Some(PathBuf::from("company_sales.csv")),
            model: None,
            backend: None,
            base_url: None,
            api_key: None,
            temperature: None,
            timeout: None,
            query_context: None,
            halt_on_error: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_default_command_is_interactive() {
        assert_eq!(make_args().command(), Command::Interactive);
    }

    #[test]
    fn test_parse_ask_with_global_options() {
        let args = Args::try_parse_from([
            "sales-insight",
            "ask",
            "Which",
            "Product",
            "won?",
            "--backend",
            "ollama",
            "--query-context",
            "summary",
        ])
        .unwrap();

        assert_eq!(
            args.command(),
            Command::Ask {
                question: vec!["Which".to_string(), "Product".to_string(), "won?".to_string()]
            }
        );
        assert_eq!(args.backend, Some(BackendKind::Ollama));
        assert_eq!(args.query_context, Some(DatasetContext::Summary));
    }

    #[test]
    fn test_parse_ask_without_question() {
        let args = Args::try_parse_from(["sales-insight", "ask"]).unwrap();
        assert_eq!(args.command(), Command::Ask { question: vec![] });
    }

    #[test]
    fn test_parse_analyze_output() {
        let args = Args::try_parse_from(["sales-insight", "analyze", "-o", "r.json", "--format", "json"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Analyze {
                output: Some(PathBuf::from("r.json")),
                format: OutputFormat::Json
            }
        );
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Args::try_parse_from(["sales-insight", "ask"]).is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.base_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(2.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.temperature = Some(0.0);
        args.timeout = Some(30);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config_verbose() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
