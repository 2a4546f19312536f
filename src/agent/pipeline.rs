//! The four-stage insight pipeline.
//!
//! Stages run strictly in order, each one exactly once:
//! `Start -> Analyst -> Summarizer -> Strategist -> Emailer -> Done`.
//! Each stage's prompt is built from the text produced by the stages
//! before it, so nothing runs concurrently.

use crate::config::ErrorPolicy;
use crate::llm::CompletionClient;
use crate::models::{AggregateSummary, PipelineOutput, Stage, StageOutcome};
use crate::prompts::PromptBuilder;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Position of the coordinator in the stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Running(Stage),
    Done,
}

impl PipelineState {
    /// The state that follows this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            PipelineState::Start => PipelineState::Running(Stage::Analyst),
            PipelineState::Running(Stage::Analyst) => PipelineState::Running(Stage::Summarizer),
            PipelineState::Running(Stage::Summarizer) => PipelineState::Running(Stage::Strategist),
            PipelineState::Running(Stage::Strategist) => PipelineState::Running(Stage::Emailer),
            PipelineState::Running(Stage::Emailer) | PipelineState::Done => PipelineState::Done,
        }
    }
}

/// Receives progress notifications while the pipeline runs.
pub trait StageObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}

    fn on_stage_finish(&mut self, _stage: Stage, _outcome: &StageOutcome) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl StageObserver for SilentObserver {}

/// Outcomes recorded so far, indexed by stage position.
#[derive(Debug, Default)]
struct Progress {
    outcomes: [Option<StageOutcome>; 4],
}

impl Progress {
    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.outcomes[stage.position() - 1] = Some(outcome);
    }

    /// Text of an earlier stage; empty if it has not run.
    fn text(&self, stage: Stage) -> &str {
        self.outcomes[stage.position() - 1]
            .as_ref()
            .map(|o| o.text())
            .unwrap_or_default()
    }

    fn take(&mut self, stage: Stage) -> StageOutcome {
        self.outcomes[stage.position() - 1]
            .take()
            .unwrap_or_else(|| StageOutcome::failed(stage.failure_marker(), "stage did not run"))
    }

    fn into_output(mut self) -> PipelineOutput {
        PipelineOutput {
            analysis: self.take(Stage::Analyst),
            summary: self.take(Stage::Summarizer),
            strategy: self.take(Stage::Strategist),
            email: self.take(Stage::Emailer),
        }
    }
}

/// Runs the stages against one completion client.
pub struct Pipeline<'a> {
    prompts: &'a PromptBuilder,
    client: &'a CompletionClient,
    policy: ErrorPolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(prompts: &'a PromptBuilder, client: &'a CompletionClient, policy: ErrorPolicy) -> Self {
        Self {
            prompts,
            client,
            policy,
        }
    }

    /// Run every stage once and collect their outcomes.
    ///
    /// `report_date` is the only date that reaches the email prompt.
    pub async fn run(
        &self,
        summary: &AggregateSummary,
        report_date: NaiveDate,
        observer: &mut dyn StageObserver,
    ) -> PipelineOutput {
        info!("Starting insight pipeline ({:?} on stage error)", self.policy);

        let mut progress = Progress::default();
        let mut halted_by: Option<Stage> = None;
        let mut state = PipelineState::Start.next();

        while let PipelineState::Running(stage) = state {
            observer.on_stage_start(stage);

            let outcome = match halted_by {
                Some(failed) => {
                    debug!("Skipping {} after {} failed", stage, failed);
                    StageOutcome::failed(
                        stage.failure_marker(),
                        format!("skipped because the {} stage failed", failed),
                    )
                }
                None => {
                    info!("Running {} agent", stage);
                    let prompt = self.prompt_for(stage, summary, &progress, report_date);
                    self.complete(stage, &prompt).await
                }
            };

            if outcome.is_failed() && halted_by.is_none() && self.policy == ErrorPolicy::Halt {
                warn!("{} failed; remaining stages will be skipped", stage);
                halted_by = Some(stage);
            }

            observer.on_stage_finish(stage, &outcome);
            progress.record(stage, outcome);
            state = state.next();
        }

        let output = progress.into_output();
        let failed = output.failed_stages();
        if failed.is_empty() {
            info!("Pipeline finished");
        } else {
            warn!("Pipeline finished with {} failed stage(s)", failed.len());
        }
        output
    }

    fn prompt_for(
        &self,
        stage: Stage,
        summary: &AggregateSummary,
        progress: &Progress,
        report_date: NaiveDate,
    ) -> String {
        match stage {
            Stage::Analyst => self.prompts.build_analyst_prompt(summary),
            Stage::Summarizer => self
                .prompts
                .build_summarizer_prompt(progress.text(Stage::Analyst), summary),
            Stage::Strategist => self.prompts.build_strategy_prompt(progress.text(Stage::Summarizer)),
            Stage::Emailer => self.prompts.build_email_prompt(
                progress.text(Stage::Summarizer),
                progress.text(Stage::Strategist),
                report_date,
            ),
        }
    }

    async fn complete(&self, stage: Stage, prompt: &str) -> StageOutcome {
        match self.client.complete(prompt).await {
            Ok(text) => StageOutcome::generated(text),
            Err(e) => {
                warn!("{} stage failed: {}", stage, e);
                StageOutcome::failed(stage.failure_marker(), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize;
    use crate::config::Config;
    use crate::error::CompletionError;
    use crate::llm::testing::ScriptedBackend;
    use crate::models::{SalesDataset, SalesRecord};
    use std::sync::Arc;
    use std::time::Duration;

    fn summary() -> AggregateSummary {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let dataset = SalesDataset::new(
            "test",
            vec![
                SalesRecord::new(d(1, 1), "Phone", 1000.0, 400.0, 10),
                SalesRecord::new(d(2, 1), "Laptop", 2000.0, 500.0, 5),
            ],
        );
        summarize(&dataset).unwrap()
    }

    fn prompts() -> PromptBuilder {
        let config = Config::default();
        PromptBuilder::new(&config.prompts, &config.query).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Vec<String>,
    }

    impl StageObserver for RecordingObserver {
        fn on_stage_start(&mut self, stage: Stage) {
            self.events.push(format!("start {}", stage.position()));
        }

        fn on_stage_finish(&mut self, stage: Stage, outcome: &StageOutcome) {
            let status = if outcome.is_failed() { "failed" } else { "ok" };
            self.events.push(format!("finish {} {}", stage.position(), status));
        }
    }

    #[test]
    fn test_state_sequence() {
        let mut state = PipelineState::Start;
        let mut visited = Vec::new();
        loop {
            state = state.next();
            match state {
                PipelineState::Running(stage) => visited.push(stage),
                _ => break,
            }
        }
        assert_eq!(visited, Stage::ALL.to_vec());
        assert_eq!(state, PipelineState::Done);
        assert_eq!(PipelineState::Done.next(), PipelineState::Done);
    }

    #[tokio::test]
    async fn test_each_stage_feeds_the_next() {
        let backend = Arc::new(ScriptedBackend::scripted(
            vec![
                Ok("ANALYSIS TEXT".to_string()),
                Ok("SUMMARY TEXT".to_string()),
                Ok("STRATEGY TEXT".to_string()),
                Ok("EMAIL TEXT".to_string()),
            ],
            Ok("unexpected".to_string()),
        ));
        let client = CompletionClient::new(backend.clone(), "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Continue);

        let output = pipeline.run(&summary(), date(), &mut SilentObserver).await;

        assert_eq!(output.analysis.text(), "ANALYSIS TEXT");
        assert_eq!(output.summary.text(), "SUMMARY TEXT");
        assert_eq!(output.strategy.text(), "STRATEGY TEXT");
        assert_eq!(output.email.text(), "EMAIL TEXT");
        assert!(output.failed_stages().is_empty());

        let sent = backend.prompts();
        assert_eq!(sent.len(), 4);
        assert!(sent[0].starts_with("As a Data Analyst Agent"));
        assert!(sent[1].contains("ANALYSIS TEXT"));
        assert!(sent[2].contains("SUMMARY TEXT"));
        assert!(sent[3].contains("SUMMARY TEXT"));
        assert!(sent[3].contains("STRATEGY TEXT"));
        assert!(sent[3].contains("July 04, 2024"));
    }

    #[tokio::test]
    async fn test_observer_sees_every_stage_once_in_order() {
        let backend = Arc::new(ScriptedBackend::replying("ok"));
        let client = CompletionClient::new(backend, "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Continue);

        let mut observer = RecordingObserver::default();
        pipeline.run(&summary(), date(), &mut observer).await;

        assert_eq!(
            observer.events,
            vec![
                "start 1", "finish 1 ok", "start 2", "finish 2 ok", "start 3", "finish 3 ok", "start 4",
                "finish 4 ok",
            ]
        );
    }

    #[tokio::test]
    async fn test_continue_threads_error_text_forward() {
        let backend = Arc::new(ScriptedBackend::scripted(
            vec![Err(CompletionError::Timeout(Duration::from_secs(1)))],
            Ok("fine".to_string()),
        ));
        let client = CompletionClient::new(backend.clone(), "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Continue);

        let output = pipeline.run(&summary(), date(), &mut SilentObserver).await;

        assert!(output.analysis.is_failed());
        assert!(output
            .analysis
            .text()
            .starts_with("Error generating AI insights: Request timed out"));
        assert_eq!(output.failed_stages(), vec![Stage::Analyst]);

        let sent = backend.prompts();
        assert_eq!(sent.len(), 4);
        assert!(sent[1].contains("Error generating AI insights: Request timed out"));
    }

    #[tokio::test]
    async fn test_all_stages_fail_with_markers() {
        let backend = Arc::new(ScriptedBackend::failing(CompletionError::Connect(
            "http://localhost:11434".to_string(),
        )));
        let client = CompletionClient::new(backend.clone(), "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Continue);

        let output = pipeline.run(&summary(), date(), &mut SilentObserver).await;

        assert_eq!(output.failed_stages(), Stage::ALL.to_vec());
        assert!(output.summary.text().starts_with("Error generating summary"));
        assert!(output.strategy.text().starts_with("Error generating strategy"));
        assert!(output.email.text().starts_with("Error generating email report"));
        assert_eq!(backend.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_halt_skips_remaining_backend_calls() {
        let backend = Arc::new(ScriptedBackend::scripted(
            vec![
                Ok("ANALYSIS".to_string()),
                Err(CompletionError::Api {
                    status: 500,
                    body: "overloaded".to_string(),
                }),
            ],
            Ok("should not be used".to_string()),
        ));
        let client = CompletionClient::new(backend.clone(), "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Halt);

        let mut observer = RecordingObserver::default();
        let output = pipeline.run(&summary(), date(), &mut observer).await;

        assert_eq!(backend.requests().len(), 2);
        assert_eq!(output.analysis.text(), "ANALYSIS");
        assert!(output.summary.text().starts_with("Error generating summary: Backend API error 500"));
        assert_eq!(
            output.strategy.text(),
            "Error generating strategy: skipped because the Summarizer stage failed"
        );
        assert!(output.email.is_failed());
        assert_eq!(observer.events.len(), 8);
    }

    #[test]
    fn test_runs_on_blocking_executor() {
        let backend = Arc::new(ScriptedBackend::replying("done"));
        let client = CompletionClient::new(backend, "m", 0.7);
        let builder = prompts();
        let pipeline = Pipeline::new(&builder, &client, ErrorPolicy::Continue);

        let output = tokio_test::block_on(pipeline.run(&summary(), date(), &mut SilentObserver));
        assert_eq!(output.email.text(), "done");
    }
}
