//! Prompt construction for each stage.
//!
//! Every `build_*` function is pure: the same inputs render the same text.
//! The only date that reaches a prompt is the one passed in explicitly.

use crate::analysis::{dataset_totals, distinct_products};
use crate::config::{DatasetContext, PromptConfig, QueryConfig};
use crate::error::TemplateError;
use crate::format::{format_amount, format_percent, text_table};
use crate::models::{AggregateSummary, SalesDataset, SalesRecord};
use crate::prompts::template::Template;
use chrono::NaiveDate;

const ANALYST_SLOTS: &[&str] = &[
    "total_revenue",
    "total_expenses",
    "total_profit",
    "profit_margin",
    "avg_customers",
    "product_table",
    "monthly_table",
    "best_month",
    "best_product",
    "sections",
];
const SUMMARIZER_SLOTS: &[&str] = &[
    "total_revenue",
    "total_profit",
    "profit_margin",
    "best_month",
    "best_product",
    "insights",
    "bullet_count",
];
const STRATEGIST_SLOTS: &[&str] = &["insights", "focus_areas"];
const EMAIL_SLOTS: &[&str] = &["summary", "strategy", "date"];
const QUERY_SLOTS: &[&str] = &["question", "data_context", "dataset"];

/// Compiled templates plus the options that fill their list slots.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    analyst: Template,
    summarizer: Template,
    strategist: Template,
    email: Template,
    query: Template,
    bullet_count: usize,
    sections: Vec<String>,
    strategy_focus: Vec<String>,
    dataset_context: DatasetContext,
    sample_rows: usize,
}

impl PromptBuilder {
    /// Compile all templates from configuration.
    pub fn new(prompts: &PromptConfig, query: &QueryConfig) -> Result<Self, TemplateError> {
        let t = &prompts.templates;

        Ok(Self {
            analyst: Template::compile("analyst", &t.analyst, ANALYST_SLOTS, &[])?,
            summarizer: Template::compile("summarizer", &t.summarizer, SUMMARIZER_SLOTS, &["insights"])?,
            strategist: Template::compile("strategist", &t.strategist, STRATEGIST_SLOTS, &["insights"])?,
            email: Template::compile("email", &t.email, EMAIL_SLOTS, &["summary", "strategy"])?,
            query: Template::compile("query", &t.query, QUERY_SLOTS, &["question"])?,
            bullet_count: prompts.bullet_count,
            sections: prompts.sections.clone(),
            strategy_focus: prompts.strategy_focus.clone(),
            dataset_context: query.dataset_context,
            sample_rows: query.sample_rows,
        })
    }

    /// Prompt for the analyst stage.
    pub fn build_analyst_prompt(&self, summary: &AggregateSummary) -> String {
        self.analyst.render(&[
            ("total_revenue", format_amount(summary.total_revenue)),
            ("total_expenses", format_amount(summary.total_expenses)),
            ("total_profit", format_amount(summary.total_profit)),
            ("profit_margin", format_percent(summary.profit_margin)),
            ("avg_customers", format!("{:.0}", summary.avg_customers)),
            ("product_table", product_table(summary)),
            ("monthly_table", monthly_table(summary)),
            ("best_month", summary.best_month.clone()),
            ("best_product", summary.best_product.clone()),
            ("sections", numbered_list(&self.sections)),
        ])
    }

    /// Prompt for the summarizer stage.
    pub fn build_summarizer_prompt(&self, analyst_text: &str, summary: &AggregateSummary) -> String {
        self.summarizer.render(&[
            ("total_revenue", format_amount(summary.total_revenue)),
            ("total_profit", format_amount(summary.total_profit)),
            ("profit_margin", format_percent(summary.profit_margin)),
            ("best_month", summary.best_month.clone()),
            ("best_product", summary.best_product.clone()),
            ("insights", analyst_text.to_string()),
            ("bullet_count", self.bullet_count.to_string()),
        ])
    }

    /// Prompt for the strategy stage.
    pub fn build_strategy_prompt(&self, summary_text: &str) -> String {
        self.strategist.render(&[
            ("insights", summary_text.to_string()),
            ("focus_areas", numbered_list(&self.strategy_focus)),
        ])
    }

    /// Prompt for the email stage.
    pub fn build_email_prompt(&self, summary_text: &str, strategy_text: &str, date: NaiveDate) -> String {
        self.email.render(&[
            ("summary", summary_text.to_string()),
            ("strategy", strategy_text.to_string()),
            ("date", date.format("%B %d, %Y").to_string()),
        ])
    }

    /// Prompt for a free-form question about the dataset.
    ///
    /// Works on any dataset, including an empty one, and any question,
    /// including an empty string.
    pub fn build_query_prompt(&self, question: &str, dataset: &SalesDataset) -> String {
        let shown = dataset.len().min(self.sample_rows);
        let sample = format!(
            "Sample Data (first {} of {} rows):\n{}",
            shown,
            dataset.len(),
            dataset_table(&dataset.records()[..shown])
        );
        let rows = match self.dataset_context {
            DatasetContext::Full => format!("{}\n\nFull Dataset:\n{}", sample, dataset_table(dataset.records())),
            DatasetContext::Summary => sample,
        };

        self.query.render(&[
            ("question", question.trim().to_string()),
            ("data_context", data_context(dataset)),
            ("dataset", rows),
        ])
    }
}

fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-product table in first-seen order.
pub fn product_table(summary: &AggregateSummary) -> String {
    let rows: Vec<Vec<String>> = summary
        .products
        .iter()
        .map(|(product, s)| {
            vec![
                product.clone(),
                format_amount(s.revenue),
                format_amount(s.expenses),
                format_amount(s.profit),
                s.customers.to_string(),
            ]
        })
        .collect();

    text_table(&["Product", "Revenue", "Expenses", "Profit", "Customers"], &rows)
}

/// Per-month table in first-seen order.
pub fn monthly_table(summary: &AggregateSummary) -> String {
    let rows: Vec<Vec<String>> = summary
        .months
        .iter()
        .map(|(month, s)| {
            vec![
                month.clone(),
                format_amount(s.revenue),
                format_amount(s.profit),
                s.customers.to_string(),
            ]
        })
        .collect();

    text_table(&["Month", "Revenue", "Profit", "Customers"], &rows)
}

/// Every given record as a table row.
pub fn dataset_table(records: &[SalesRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.date.format("%Y-%m-%d").to_string(),
                r.product.clone(),
                format_amount(r.revenue),
                format_amount(r.expenses),
                r.customers.to_string(),
                format_amount(r.profit),
                r.month.clone(),
            ]
        })
        .collect();

    text_table(
        &["Date", "Product", "Revenue", "Expenses", "Customers", "Profit", "Month"],
        &rows,
    )
}

fn data_context(dataset: &SalesDataset) -> String {
    let totals = dataset_totals(dataset);
    let records = dataset.records();

    let period = match (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) {
        (Some(start), Some(end)) => format!("{} - {}", start.format("%B %Y"), end.format("%B %Y")),
        _ => "n/a".to_string(),
    };

    let products = distinct_products(dataset);
    let products = if products.is_empty() {
        "none".to_string()
    } else {
        products.join(", ")
    };

    let avg_customers = totals
        .avg_customers
        .map(|avg| format!("{:.0}", avg))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "Dataset Overview:\n\
         - Time Period: {}\n\
         - Products: {}\n\
         - Total Records: {}\n\
         \n\
         Key Statistics:\n\
         - Total Revenue: ${}\n\
         - Total Profit: ${}\n\
         - Average Monthly Customers: {}",
        period,
        products,
        dataset.len(),
        format_amount(totals.revenue),
        format_amount(totals.profit),
        avg_customers
    )
}
