//! Error types for each stage of the analysis.
//!
//! Loading and summarizing failures are fatal for the operation that hit
//! them. Completion failures are recoverable: stages turn them into
//! displayable text (see [`crate::models::StageOutcome`]).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to read or parse the sales dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read dataset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: cannot parse {column} value '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Failure to compute aggregate statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Dataset is empty; no aggregates can be computed")]
    EmptyDataset,

    #[error("Total revenue is zero; profit margin is undefined")]
    ZeroRevenue,
}

/// Failure reported by a completion backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot connect to completion backend at {0}")]
    Connect(String),

    #[error("Backend API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(String),
}

/// Failure to compile a prompt template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{template}' references unknown slot '{{{slot}}}'")]
    UnknownSlot { template: String, slot: String },

    #[error("Template '{template}' must contain slot '{{{slot}}}'")]
    MissingSlot { template: String, slot: String },

    #[error("Template '{template}' has an unbalanced brace at byte {offset}")]
    Unbalanced { template: String, offset: usize },
}
