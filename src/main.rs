//! Sales Insight - LLM-generated insights for sales data
//!
//! A CLI tool that loads a sales CSV, computes summary statistics, and
//! runs an analyst / summarizer / strategist / email pipeline against a
//! completion backend (OpenAI-compatible such as Groq, or Ollama).
//!
//! Exit codes:
//!   0 - Success (stage failures are reported in the output, not here)
//!   1 - Fatal error (bad config, unreadable dataset, no working model)

mod agent;
mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod format;
mod interactive;
mod llm;
mod models;
mod progress;
mod prompts;
mod report;
mod session;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use llm::CompletionClient;
use progress::ConsoleProgress;
use report::EmailEnvelope;
use session::Session;
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Models tried by `probe` when none are given.
const PROBE_CANDIDATES: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.1-70b-versatile",
    "llama-3.2-1b-preview",
    "llama-3.2-3b-preview",
    "mixtral-8x7b-32768",
    "gemma2-9b-it",
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config file can turn on verbose logging, so it is read before
    // the subscriber is installed and its origin is logged afterwards.
    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, config.general.verbose);

    info!("Sales Insight v{}", env!("CARGO_PKG_VERSION"));
    source.log();
    debug!("Command: {:?}", args.command());

    if let Err(e) = run(args, config).await {
        error!("Failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .salesinsight.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, backend, prompts, and email envelope.");
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr so
/// stdout carries only the generated text.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Merge CLI overrides into the loaded config, then run the selected command.
async fn run(args: Args, mut config: Config) -> Result<()> {
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let command = args.command();

    // Probing needs a backend but no dataset.
    if let Command::Probe { ref models } = command {
        return probe_models(&config, models).await;
    }

    // Listing sample questions needs neither.
    if let Command::Ask { ref question } = command {
        if question.is_empty() {
            println!("{}", interactive::sample_questions());
            println!("Run `sales-insight ask <question>` to ask one.");
            return Ok(());
        }
    }

    let show_progress = config.general.show_progress;
    let session = Session::from_config(config)?;
    info!(
        "Loaded {} records from {} ({} backend, model {})",
        session.dataset().len(),
        session.dataset().source(),
        session.client().backend_name(),
        session.client().model()
    );
    println!("✅ Sales data loaded successfully ({} records)", session.dataset().len());

    match command {
        Command::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            let mut progress = ConsoleProgress::new(show_progress);
            interactive::run(&session, stdin, &mut stdout, &mut progress, today).await?;
        }
        Command::Analyze { output, format } => {
            let mut progress = ConsoleProgress::new(show_progress);
            println!("\n🚀 Starting multi-agent analysis...");
            let analysis = session.analyze(today(), &mut progress).await?;
            println!("{}", report::render_results(&analysis.summary, &analysis.output));

            if let Some(path) = output {
                let report = session.report(analysis, Utc::now());
                save_report(&report, &path, format)?;
                println!("\n✅ Report saved to: {}", path.display());
            }
        }
        Command::Ask { question } => {
            let question = question.join(" ");
            println!("\n🎧 Question: {}", question);
            let answer = session.ask(&question).await;
            println!("{}\n{}", "-".repeat(50), answer);
        }
        Command::Overview => {
            println!("\n{}", session.overview()?);
        }
        Command::Email => {
            let mut progress = ConsoleProgress::new(show_progress);
            let analysis = session.analyze(today(), &mut progress).await?;
            let envelope = EmailEnvelope::new(
                &session.config().email,
                analysis.output.email.text(),
                Local::now().naive_local(),
            );
            println!("\n{}", envelope.render());
        }
        Command::Probe { .. } => {}
    }

    Ok(())
}

/// The report date for the pipeline. The only place the clock is read
/// for prompts.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Write a report in the requested format.
fn save_report(report: &models::Report, path: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => report::generate_markdown_report(report),
    };

    std::fs::write(path, &content).with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Try each model in order and stop at the first that answers.
async fn probe_models(config: &Config, models: &[String]) -> Result<()> {
    let client = CompletionClient::from_config(&config.model).context("Failed to create completion client")?;

    let candidates: Vec<String> = if models.is_empty() {
        PROBE_CANDIDATES.iter().map(|m| m.to_string()).collect()
    } else {
        models.to_vec()
    };

    println!("🔍 Probing {} model(s) on {}...\n", candidates.len(), client.backend_name());

    for model in &candidates {
        match client.probe(model).await {
            Ok(response) => {
                println!("✅ {} - WORKS", model);
                println!("   Response: {}", response.trim());
                return Ok(());
            }
            Err(e) => {
                let message: String = e.to_string().chars().take(100).collect();
                println!("❌ {} - Error: {}", model, message);
            }
        }
    }

    bail!("None of the {} candidate model(s) responded", candidates.len())
}

/// Where the configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Unreadable(String),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults. An explicit `--config`
/// that fails to load is fatal; a broken default file falls back to
/// built-in defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(format!("{:#}", e)))),
    }
}
