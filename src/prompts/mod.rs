//! Prompt templates for every stage.
//!
//! Templates are configuration (`[prompts.templates]`) with `{slot}`
//! placeholders. Slots available per template:
//!
//! - `analyst`: `total_revenue`, `total_expenses`, `total_profit`,
//!   `profit_margin`, `avg_customers`, `product_table`, `monthly_table`,
//!   `best_month`, `best_product`, `sections`
//! - `summarizer`: `total_revenue`, `total_profit`, `profit_margin`,
//!   `best_month`, `best_product`, `bullet_count`, `insights` (required)
//! - `strategist`: `focus_areas`, `insights` (required)
//! - `email`: `date`, `summary` and `strategy` (required)
//! - `query`: `data_context`, `dataset`, `question` (required)

pub mod builder;
pub mod defaults;
pub mod template;

pub use builder::{monthly_table, product_table, PromptBuilder};
