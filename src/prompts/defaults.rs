//! Built-in prompt templates and options.
//!
//! These are the values `Config::default()` starts from; every one of them
//! can be replaced in `[prompts]` / `[prompts.templates]`.

pub const ANALYST_TEMPLATE: &str = "\
As a Data Analyst Agent, analyze this company sales data and provide insights:

Key Metrics:
- Total Revenue: ${total_revenue}
- Total Expenses: ${total_expenses}
- Total Profit: ${total_profit}
- Profit Margin: {profit_margin}%
- Average Customers per Month: {avg_customers}

Product Performance:
{product_table}

Monthly Trends:
{monthly_table}

Best Performing Month: {best_month}
Best Performing Product: {best_product}

Provide detailed insights about:
{sections}

Include specific numbers and calculations in your analysis.
";

pub const SUMMARIZER_TEMPLATE: &str = "\
As a Summarizer Agent, take this detailed analysis and create {bullet_count} clear, concise bullet points:

Analysis Data:
- Total Revenue: ${total_revenue}
- Total Profit: ${total_profit}
- Profit Margin: {profit_margin}%
- Best Month: {best_month}
- Best Product: {best_product}

Detailed Insights:
{insights}

Create exactly {bullet_count} bullet points that capture the most important insights.
Make them simple, clear, and actionable for business decision-making.
";

pub const STRATEGIST_TEMPLATE: &str = "\
As a Business Strategy Agent, based on these key insights, recommend practical strategies:

Key Insights:
{insights}

Provide specific, actionable recommendations for:
{focus_areas}

Make each recommendation practical and implementable with clear next steps.
";

pub const EMAIL_TEMPLATE: &str = "\
As an Email Reporter Agent, create a professional email for the company boss summarizing monthly performance:

Key Insights Summary:
{summary}

Strategic Recommendations:
{strategy}

Create a formal business email with:
- Professional greeting
- Executive summary of performance
- Key insights (3-4 main points)
- Strategic recommendations (2-3 top priorities)
- Professional closing

Date: {date}
Make it concise but comprehensive, suitable for a busy executive.
";

pub const QUERY_TEMPLATE: &str = "\
As a friendly Customer Support Agent, answer this question about our company sales data:

Question: {question}

Data Context:
{data_context}

{dataset}

Provide a friendly, accurate, and helpful response. Include specific numbers when relevant.
If the question can't be answered with the available data, politely explain what information is available.
";

pub const BULLET_COUNT: usize = 5;

pub const SECTIONS: [&str; 5] = [
    "Revenue and profit trends",
    "Product performance comparison",
    "Customer acquisition patterns",
    "Seasonal trends",
    "Areas of concern or opportunity",
];

pub const STRATEGY_FOCUS: [&str; 5] = [
    "Increasing sales revenue",
    "Reducing operational costs",
    "Growing customer base",
    "Improving profit margins",
    "Seasonal optimization",
];

/// Questions offered to users who don't know what to ask.
pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "Which product had the highest revenue in October?",
    "What was our total profit in Q4?",
    "How many customers did we have for Tablets?",
    "What's our best performing month?",
    "Compare revenue between Laptop and Phone products",
];
