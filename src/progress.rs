//! Terminal spinner for pipeline stages.

use crate::agent::StageObserver;
use crate::models::{Stage, StageOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows one spinner per running stage on stderr.
pub struct ConsoleProgress {
    enabled: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            spinner: None,
        }
    }
}

impl StageObserver for ConsoleProgress {
    fn on_stage_start(&mut self, stage: Stage) {
        if !self.enabled {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "{} Running {} agent ({}/{})...",
            stage.emoji(),
            stage.title(),
            stage.position(),
            Stage::ALL.len()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn on_stage_finish(&mut self, stage: Stage, outcome: &StageOutcome) {
        if let Some(pb) = self.spinner.take() {
            let status = if outcome.is_failed() { "❌ failed" } else { "✅ done" };
            pb.finish_with_message(format!("{} {} {}", stage.emoji(), stage.title(), status));
        }
    }
}
