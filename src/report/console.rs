//! Plain-text rendering for the terminal.

use crate::format::{format_amount, format_currency, format_percent};
use crate::models::{AggregateSummary, PipelineOutput, Stage};
use crate::prompts::{monthly_table, product_table};

const RULE: &str = "--------------------------------------------------";

/// Render a pipeline run: insights, key metrics, then the remaining
/// stage artifacts.
pub fn render_results(summary: &AggregateSummary, output: &PipelineOutput) -> String {
    let mut out = String::new();

    out.push_str(&"=".repeat(80));
    out.push_str("\n📊 SALES INSIGHT RESULTS\n");
    out.push_str(&"=".repeat(80));
    out.push('\n');

    out.push_str(&stage_block(Stage::Analyst, output));

    out.push_str("\n💰 Key Metrics:\n");
    out.push_str(&format!("• Total Revenue: {}\n", format_currency(summary.total_revenue)));
    out.push_str(&format!("• Total Profit: {}\n", format_currency(summary.total_profit)));
    out.push_str(&format!("• Profit Margin: {}%\n", format_percent(summary.profit_margin)));
    out.push_str(&format!("• Best Month: {}\n", summary.best_month));
    out.push_str(&format!("• Best Product: {}\n", summary.best_product));

    for stage in [Stage::Summarizer, Stage::Strategist, Stage::Emailer] {
        out.push_str(&stage_block(stage, output));
    }

    out
}

fn stage_block(stage: Stage, output: &PipelineOutput) -> String {
    format!(
        "\n{} {}:\n{}\n{}\n",
        stage.emoji(),
        stage.artifact().to_uppercase(),
        RULE,
        output.get(stage).text()
    )
}

/// Render aggregate metrics with the product and monthly tables.
pub fn render_overview(summary: &AggregateSummary) -> String {
    let mut out = String::new();

    out.push_str("📈 Key Metrics\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "Period:         {} to {}\n",
        summary.period_start.format("%Y-%m-%d"),
        summary.period_end.format("%Y-%m-%d")
    ));
    out.push_str(&format!("Records:        {}\n", summary.record_count));
    out.push_str(&format!("Total Revenue:  {}\n", format_currency(summary.total_revenue)));
    out.push_str(&format!("Total Expenses: {}\n", format_currency(summary.total_expenses)));
    out.push_str(&format!("Total Profit:   {}\n", format_currency(summary.total_profit)));
    out.push_str(&format!("Profit Margin:  {}%\n", format_percent(summary.profit_margin)));
    out.push_str(&format!("Avg Customers:  {}\n", format_amount(summary.avg_customers.round())));
    out.push_str(&format!("Best Month:     {}\n", summary.best_month));
    out.push_str(&format!("Best Product:   {}\n", summary.best_product));

    out.push_str("\n📦 Product Performance\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&product_table(summary));
    out.push('\n');

    out.push_str("\n📅 Monthly Trends\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&monthly_table(summary));
    out.push('\n');

    out
}
