//! Data models for the sales analysis.
//!
//! This module contains the core data structures used throughout the
//! application: loaded records, aggregate statistics, stage results, and
//! the final report.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the sales dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Calendar date of the sale.
    pub date: NaiveDate,
    /// Product category label.
    pub product: String,
    /// Revenue for the row.
    pub revenue: f64,
    /// Expenses for the row.
    pub expenses: f64,
    /// Number of customers.
    pub customers: u64,
    /// Derived: `revenue - expenses`.
    pub profit: f64,
    /// Derived: full month name of `date` (e.g. "January").
    pub month: String,
}

impl SalesRecord {
    /// Build a record, deriving `profit` and `month`.
    pub fn new(
        date: NaiveDate,
        product: impl Into<String>,
        revenue: f64,
        expenses: f64,
        customers: u64,
    ) -> Self {
        Self {
            date,
            product: product.into(),
            revenue,
            expenses,
            customers,
            profit: revenue - expenses,
            month: date.format("%B").to_string(),
        }
    }
}

/// The loaded table. Read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesDataset {
    source: String,
    records: Vec<SalesRecord>,
}

impl SalesDataset {
    pub fn new(source: impl Into<String>, records: Vec<SalesRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Where the data came from (file path or label).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-product sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub customers: u64,
}

/// Per-month sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthStats {
    pub revenue: f64,
    pub profit: f64,
    pub customers: u64,
}

/// Aggregate statistics over a non-empty dataset.
///
/// Grouping tables keep first-seen order so rendered text is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub record_count: usize,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    /// `100 * total_profit / total_revenue`.
    pub profit_margin: f64,
    /// Mean of the customers column.
    pub avg_customers: f64,
    pub products: IndexMap<String, ProductStats>,
    pub months: IndexMap<String, MonthStats>,
    pub best_month: String,
    pub best_product: String,
}

/// A stage of the insight pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analyst,
    Summarizer,
    Strategist,
    Emailer,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::Analyst,
        Stage::Summarizer,
        Stage::Strategist,
        Stage::Emailer,
    ];

    /// Human-readable agent name.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Analyst => "Data Analyst",
            Stage::Summarizer => "Summarizer",
            Stage::Strategist => "Business Strategy",
            Stage::Emailer => "Email Reporter",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Stage::Analyst => "📊",
            Stage::Summarizer => "📝",
            Stage::Strategist => "💡",
            Stage::Emailer => "📧",
        }
    }

    /// Heading for the artifact this stage produces.
    pub fn artifact(&self) -> &'static str {
        match self {
            Stage::Analyst => "Data Analysis Insights",
            Stage::Summarizer => "Executive Summary",
            Stage::Strategist => "Business Strategy Recommendations",
            Stage::Emailer => "Email Report",
        }
    }

    /// Prefix of the text substituted when this stage's completion fails.
    pub fn failure_marker(&self) -> &'static str {
        match self {
            Stage::Analyst => "Error generating AI insights",
            Stage::Summarizer => "Error generating summary",
            Stage::Strategist => "Error generating strategy",
            Stage::Emailer => "Error generating email report",
        }
    }

    /// 1-based position in the pipeline.
    pub fn position(&self) -> usize {
        match self {
            Stage::Analyst => 1,
            Stage::Summarizer => 2,
            Stage::Strategist => 3,
            Stage::Emailer => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Result of one completion-backed stage.
///
/// Either variant carries displayable text, so callers can always print
/// something for the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageOutcome {
    Generated { text: String },
    Failed { message: String },
}

impl StageOutcome {
    pub fn generated(text: impl Into<String>) -> Self {
        StageOutcome::Generated { text: text.into() }
    }

    /// A failure rendered as `"{marker}: {cause}"`.
    pub fn failed(marker: &str, cause: impl fmt::Display) -> Self {
        StageOutcome::Failed {
            message: format!("{}: {}", marker, cause),
        }
    }

    /// The generated text, or the failure message.
    pub fn text(&self) -> &str {
        match self {
            StageOutcome::Generated { text } => text,
            StageOutcome::Failed { message } => message,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// The four artifacts produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub analysis: StageOutcome,
    pub summary: StageOutcome,
    pub strategy: StageOutcome,
    pub email: StageOutcome,
}

impl PipelineOutput {
    /// Outcome for a given stage.
    pub fn get(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Analyst => &self.analysis,
            Stage::Summarizer => &self.summary,
            Stage::Strategist => &self.strategy,
            Stage::Emailer => &self.email,
        }
    }

    /// Stages whose completion failed, in pipeline order.
    pub fn failed_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.get(*s).is_failed())
            .collect()
    }
}

/// Metadata about a saved report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dataset path or label.
    pub data_source: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// Completion backend name.
    pub backend: String,
    /// Number of dataset rows.
    pub records: usize,
    /// Stages that produced error text instead of generated content.
    pub failed_stages: Vec<Stage>,
    /// Duration of the pipeline run in seconds.
    pub duration_seconds: f64,
}

/// A complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: AggregateSummary,
    pub output: PipelineOutput,
}
