//! Report rendering: console output, saved reports, and the email envelope.

pub mod console;
pub mod email;
pub mod generator;

pub use console::{render_overview, render_results};
pub use email::EmailEnvelope;
pub use generator::{generate_json_report, generate_markdown_report};
