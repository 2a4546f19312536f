//! Everything one analysis needs, passed explicitly to each operation.

use crate::agent::{Pipeline, QueryResponder, StageObserver};
use crate::analysis::summarize;
use crate::config::Config;
use crate::data::load_dataset;
use crate::llm::CompletionClient;
use crate::models::{AggregateSummary, PipelineOutput, Report, ReportMetadata, SalesDataset, StageOutcome};
use crate::prompts::PromptBuilder;
use crate::report::render_overview;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// A finished pipeline run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: AggregateSummary,
    pub output: PipelineOutput,
    pub duration: Duration,
}

/// Config, dataset, prompt templates, and completion client.
///
/// The dataset is read-only once loaded; separate sessions share nothing.
pub struct Session {
    config: Config,
    dataset: SalesDataset,
    prompts: PromptBuilder,
    client: CompletionClient,
}

impl Session {
    /// Assemble a session from parts that are already loaded.
    pub fn new(config: Config, dataset: SalesDataset, client: CompletionClient) -> Result<Self> {
        let prompts = PromptBuilder::new(&config.prompts, &config.query).context("Invalid prompt template")?;
        Ok(Self {
            config,
            dataset,
            prompts,
            client,
        })
    }

    /// Load the configured dataset and connect the configured backend.
    pub fn from_config(config: Config) -> Result<Self> {
        let dataset = load_dataset(Path::new(&config.data.path))
            .with_context(|| format!("Failed to load sales data from {}", config.data.path))?;
        let client = CompletionClient::from_config(&config.model).context("Failed to create completion client")?;
        Self::new(config, dataset, client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &SalesDataset {
        &self.dataset
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Aggregate statistics for the loaded dataset.
    pub fn summary(&self) -> Result<AggregateSummary> {
        summarize(&self.dataset).context("Cannot summarize sales data")
    }

    /// Run the full pipeline. Only an unsummarizable dataset is an error;
    /// backend failures are reported inside the output.
    pub async fn analyze(&self, report_date: NaiveDate, observer: &mut dyn StageObserver) -> Result<Analysis> {
        let summary = self.summary()?;
        let started = Instant::now();

        let pipeline = Pipeline::new(&self.prompts, &self.client, self.config.pipeline.on_stage_error);
        let output = pipeline.run(&summary, report_date, observer).await;

        let duration = started.elapsed();
        info!("Analysis finished in {:.1}s", duration.as_secs_f64());
        Ok(Analysis {
            summary,
            output,
            duration,
        })
    }

    /// Answer a free-form question about the dataset.
    pub async fn ask(&self, question: &str) -> StageOutcome {
        QueryResponder::new(&self.prompts, &self.client)
            .answer(question, &self.dataset)
            .await
    }

    /// Metrics and tables without any backend call.
    pub fn overview(&self) -> Result<String> {
        Ok(render_overview(&self.summary()?))
    }

    /// Package an analysis as a saveable report.
    pub fn report(&self, analysis: Analysis, analysis_date: DateTime<Utc>) -> Report {
        Report {
            metadata: ReportMetadata {
                data_source: self.dataset.source().to_string(),
                analysis_date,
                model_used: self.client.model().to_string(),
                backend: self.client.backend_name().to_string(),
                records: self.dataset.len(),
                failed_stages: analysis.output.failed_stages(),
                duration_seconds: analysis.duration.as_secs_f64(),
            },
            summary: analysis.summary,
            output: analysis.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SilentObserver;
    use crate::config::BackendKind;
    use crate::llm::testing::ScriptedBackend;
    use crate::models::SalesRecord;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn dataset() -> SalesDataset {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        SalesDataset::new(
            "memory",
            vec![
                SalesRecord::new(d(1, 1), "Phone", 1000.0, 400.0, 10),
                SalesRecord::new(d(2, 1), "Laptop", 2000.0, 500.0, 5),
            ],
        )
    }

    fn session(dataset: SalesDataset, backend: Arc<ScriptedBackend>) -> Session {
        let client = CompletionClient::new(backend, "test-model", 0.7);
        Session::new(Config::default(), dataset, client).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_and_report() {
        let backend = Arc::new(ScriptedBackend::replying("text"));
        let session = session(dataset(), backend.clone());
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let analysis = session.analyze(date, &mut SilentObserver).await.unwrap();
        assert_eq!(analysis.summary.best_product, "Laptop");
        assert_eq!(analysis.output.email.text(), "text");
        assert_eq!(backend.requests().len(), 4);

        let report = session.report(analysis, Utc::now());
        assert_eq!(report.metadata.data_source, "memory");
        assert_eq!(report.metadata.model_used, "test-model");
        assert_eq!(report.metadata.backend, "scripted");
        assert_eq!(report.metadata.records, 2);
        assert!(report.metadata.failed_stages.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_empty_dataset_makes_no_calls() {
        let backend = Arc::new(ScriptedBackend::replying("text"));
        let session = session(SalesDataset::new("empty", vec![]), backend.clone());
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(session.analyze(date, &mut SilentObserver).await.is_err());
        assert!(session.overview().is_err());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ask_uses_dataset() {
        let backend = Arc::new(ScriptedBackend::replying("Laptops."));
        let session = session(dataset(), backend.clone());

        let answer = session.ask("What sold best?").await;
        assert_eq!(answer.text(), "Laptops.");
        assert!(backend.prompts()[0].contains("Products: Phone, Laptop"));
    }

    #[test]
    fn test_from_config_loads_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Product,Revenue,Expenses,Customers").unwrap();
        writeln!(file, "2024-01-15,Phone,1000,400,10").unwrap();

        let mut config = Config::default();
        config.data.path = file.path().display().to_string();
        config.model.backend = BackendKind::Ollama;
        config.model.base_url = "http://localhost:11434".to_string();

        let session = Session::from_config(config).unwrap();
        assert_eq!(session.dataset().len(), 1);
        assert_eq!(session.client().backend_name(), "ollama");
        assert!(session.overview().unwrap().contains("Phone"));
    }

    #[test]
    fn test_from_config_missing_file() {
        let mut config = Config::default();
        config.data.path = "/nonexistent/sales.csv".to_string();
        let err = Session::from_config(config).err().unwrap();
        assert!(err.to_string().contains("Failed to load sales data"));
    }
}
