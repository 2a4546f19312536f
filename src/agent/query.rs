//! One-shot questions about the dataset.

use crate::llm::CompletionClient;
use crate::models::{SalesDataset, StageOutcome};
use crate::prompts::PromptBuilder;
use tracing::{info, warn};

/// Prefix of the answer returned when the backend call fails.
pub const QUERY_FAILURE_MARKER: &str = "I apologize, but I encountered an error processing your question";

/// Answers free-form questions. Holds no state between questions.
pub struct QueryResponder<'a> {
    prompts: &'a PromptBuilder,
    client: &'a CompletionClient,
}

impl<'a> QueryResponder<'a> {
    pub fn new(prompts: &'a PromptBuilder, client: &'a CompletionClient) -> Self {
        Self { prompts, client }
    }

    /// Answer `question` using the dataset as context.
    ///
    /// Any question is accepted, including an empty one. A backend failure
    /// becomes an apology carrying the error text.
    pub async fn answer(&self, question: &str, dataset: &SalesDataset) -> StageOutcome {
        info!("Answering question ({} chars)", question.trim().len());
        let prompt = self.prompts.build_query_prompt(question, dataset);

        match self.client.complete(&prompt).await {
            Ok(text) => StageOutcome::generated(text),
            Err(e) => {
                warn!("Query failed: {}", e);
                StageOutcome::failed(QUERY_FAILURE_MARKER, e)
            }
        }
    }
}
