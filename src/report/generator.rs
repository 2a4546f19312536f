//! Markdown and JSON report generation.
//!
//! This module turns a finished analysis into a report file saved by
//! `analyze --output`.

use crate::format::{format_amount, format_currency, format_percent};
use crate::models::{AggregateSummary, PipelineOutput, Report, ReportMetadata, Stage};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Sales Insight Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_metrics_section(&report.summary));
    output.push_str(&generate_breakdown_section(&report.summary));
    output.push_str(&generate_stage_sections(&report.output));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.data_source));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Backend:** {}\n", metadata.backend));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    if !metadata.failed_stages.is_empty() {
        let names: Vec<&str> = metadata.failed_stages.iter().map(|s| s.title()).collect();
        section.push_str(&format!("- **Failed Stages:** {}\n", names.join(", ")));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn anchor(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Generate the table of contents.
fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Key Metrics](#key-metrics)\n");
    toc.push_str("- [Breakdown](#breakdown)\n");
    for stage in Stage::ALL {
        toc.push_str(&format!("- [{}](#{})\n", stage.artifact(), anchor(stage.artifact())));
    }
    toc.push('\n');

    toc
}

/// Generate the key metrics table.
fn generate_metrics_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## Key Metrics\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Period | {} to {} |\n",
        summary.period_start.format("%Y-%m-%d"),
        summary.period_end.format("%Y-%m-%d")
    ));
    section.push_str(&format!("| Total Revenue | {} |\n", format_currency(summary.total_revenue)));
    section.push_str(&format!("| Total Expenses | {} |\n", format_currency(summary.total_expenses)));
    section.push_str(&format!("| Total Profit | {} |\n", format_currency(summary.total_profit)));
    section.push_str(&format!("| Profit Margin | {}% |\n", format_percent(summary.profit_margin)));
    section.push_str(&format!("| Average Customers | {:.1} |\n", summary.avg_customers));
    section.push_str(&format!("| Best Month | {} |\n", summary.best_month));
    section.push_str(&format!("| Best Product | {} |\n", summary.best_product));
    section.push('\n');

    section
}

/// Generate the per-product and per-month tables.
fn generate_breakdown_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## Breakdown\n\n");

    section.push_str("### By Product\n\n");
    section.push_str("| Product | Revenue | Expenses | Profit | Customers |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for (product, stats) in &summary.products {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            product,
            format_amount(stats.revenue),
            format_amount(stats.expenses),
            format_amount(stats.profit),
            stats.customers
        ));
    }
    section.push('\n');

    section.push_str("### By Month\n\n");
    section.push_str("| Month | Revenue | Profit | Customers |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for (month, stats) in &summary.months {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            month,
            format_amount(stats.revenue),
            format_amount(stats.profit),
            stats.customers
        ));
    }
    section.push('\n');

    section
}

/// Generate one section per pipeline stage.
fn generate_stage_sections(output: &PipelineOutput) -> String {
    let mut section = String::new();

    for stage in Stage::ALL {
        let outcome = output.get(stage);
        section.push_str(&format!("## {}\n\n", stage.artifact()));
        if outcome.is_failed() {
            section.push_str(&format!("> ⚠️ The {} stage failed.\n\n", stage.title()));
        }
        section.push_str(outcome.text().trim_end());
        section.push_str("\n\n");
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by sales-insight v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize;
    use crate::models::{SalesDataset, SalesRecord, StageOutcome};
    use chrono::{NaiveDate, Utc};

    fn create_test_report() -> Report {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let summary = summarize(&SalesDataset::new(
            "company_sales.csv",
            vec![
                SalesRecord::new(d(1, 1), "Phone", 1000.0, 400.0, 10),
                SalesRecord::new(d(2, 1), "Laptop", 2000.0, 500.0, 5),
            ],
        ))
        .unwrap();

        let output = PipelineOutput {
            analysis: StageOutcome::generated("Laptop revenue doubled phones."),
            summary: StageOutcome::generated("- Revenue $3,000"),
            strategy: StageOutcome::failed(Stage::Strategist.failure_marker(), "Request timed out after 120s"),
            email: StageOutcome::generated("Dear Boss,"),
        };

        Report {
            metadata: ReportMetadata {
                data_source: "company_sales.csv".to_string(),
                analysis_date: Utc::now(),
                model_used: "llama-3.1-8b-instant".to_string(),
                backend: "openai".to_string(),
                records: 2,
                failed_stages: output.failed_stages(),
                duration_seconds: 12.5,
            },
            summary,
            output,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.starts_with("# Sales Insight Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Failed Stages:** Business Strategy"));
        assert!(markdown.contains("| Total Revenue | $3,000 |"));
        assert!(markdown.contains("| Profit Margin | 70.00% |"));
        assert!(markdown.contains("| Laptop | 2,000 | 500 | 1,500 | 5 |"));
        assert!(markdown.contains("| February | 2,000 | 1,500 | 5 |"));
        assert!(markdown.contains("## Executive Summary\n\n- Revenue $3,000"));
        assert!(markdown.contains("> ⚠️ The Business Strategy stage failed."));
        assert!(markdown.contains("[Email Report](#email-report)"));
    }

    #[test]
    fn test_metadata_omits_failures_when_clean() {
        let mut report = create_test_report();
        report.metadata.failed_stages.clear();

        let section = generate_metadata_section(&report.metadata);
        assert!(section.contains("`company_sales.csv`"));
        assert!(section.contains("12.5s"));
        assert!(!section.contains("Failed Stages"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["backend"], "openai");
        assert_eq!(value["metadata"]["failed_stages"][0], "strategist");
        assert_eq!(value["summary"]["best_product"], "Laptop");
        assert_eq!(value["output"]["strategy"]["status"], "failed");
        assert_eq!(value["output"]["analysis"]["text"], "Laptop revenue doubled phones.");
    }
}
