//! Console loop: `analyze`, `ask <question>`, `samples`, `quit`.

use crate::agent::StageObserver;
use crate::prompts::defaults::SAMPLE_QUESTIONS;
use crate::report::render_results;
use crate::session::Session;
use anyhow::Result;
use chrono::NaiveDate;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

const BANNER: &str = "🤖 Sales Insight ready
Available commands:
1. 'analyze' - Run full analysis workflow
2. 'ask [question]' - Ask a question about the data
3. 'samples' - Show sample questions
4. 'quit' - Exit
";

const USAGE: &str = "❌ Invalid command. Use 'analyze', 'ask [question]', 'samples', or 'quit'";

/// Numbered sample questions, ready to paste after `ask`.
pub fn sample_questions() -> String {
    let mut out = String::from("💡 Sample questions:\n");
    for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, question));
    }
    out
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Analyze,
    Ask(String),
    Samples,
    Quit,
    Empty,
    Invalid(String),
}

/// Parse a line. Only the command word is case-insensitive; the question
/// keeps its original case.
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "ask" => ReplCommand::Ask(rest.to_string()),
        "analyze" if rest.is_empty() => ReplCommand::Analyze,
        "samples" if rest.is_empty() => ReplCommand::Samples,
        "quit" | "exit" if rest.is_empty() => ReplCommand::Quit,
        _ => ReplCommand::Invalid(line.to_string()),
    }
}

/// Run the loop until `quit` or end of input.
///
/// `today` supplies the report date for each `analyze`.
pub async fn run<R, W>(
    session: &Session,
    mut input: R,
    output: &mut W,
    observer: &mut dyn StageObserver,
    today: impl Fn() -> NaiveDate,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(BANNER.as_bytes()).await?;
    output.write_all(format!("\n{}", sample_questions()).as_bytes()).await?;

    let mut line = String::new();
    loop {
        output.write_all("\n💬 Enter command: ".as_bytes()).await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            debug!("End of input");
            output.write_all("\n👋 Goodbye!\n".as_bytes()).await?;
            break;
        }

        match parse_command(&line) {
            ReplCommand::Analyze => {
                output.write_all("\n🚀 Starting analysis...\n".as_bytes()).await?;
                match session.analyze(today(), observer).await {
                    Ok(analysis) => {
                        let text = render_results(&analysis.summary, &analysis.output);
                        output.write_all(text.as_bytes()).await?;
                    }
                    Err(e) => {
                        error!("Analysis failed: {:#}", e);
                        output.write_all(format!("❌ {:#}\n", e).as_bytes()).await?;
                    }
                }
            }
            ReplCommand::Ask(question) => {
                let answer = session.ask(&question).await;
                output
                    .write_all(format!("\n🎧 Answer:\n{}\n{}\n", "-".repeat(50), answer).as_bytes())
                    .await?;
            }
            ReplCommand::Samples => {
                output.write_all(format!("\n{}", sample_questions()).as_bytes()).await?;
            }
            ReplCommand::Quit => {
                output.write_all("👋 Goodbye!\n".as_bytes()).await?;
                break;
            }
            ReplCommand::Empty => {}
            ReplCommand::Invalid(text) => {
                debug!("Unrecognized command: {}", text);
                output.write_all(format!("{}\n", USAGE).as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    Ok(())
}
