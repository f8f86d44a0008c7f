//! Interactive session: prompt, local commands and turns

mod commands;
mod display;
mod welcome;

use anyhow::{Context, Result};
use commands::{CommandOutcome, handle_command, load_conversation};
use display::{TerminalEvents, render_answer};
use fsagent_core::config::AgentConfig;
use fsagent_core::conversation::ConversationStore;
use fsagent_core::core::agent::{AgentRunner, TurnOutcome};
use fsagent_core::llm::LLMProvider;
use fsagent_core::utils::ansi::{AnsiRenderer, MessageStyle};
use fsagent_core::workspace::WorkspaceScope;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use std::io::{ErrorKind, IsTerminal};
use std::path::Path;
use tracing::{info, warn};
use welcome::render_welcome;

const PROMPT: &str = "You: ";

fn load_history(editor: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Err(e) = editor.load_history(path) {
        let missing = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == ErrorKind::NotFound);
        if !missing {
            warn!("Failed to load input history: {e}");
        }
    }
}

fn save_history(editor: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Err(e) = editor.save_history(path) {
        warn!("Failed to save input history: {e}");
    }
}

/// What the prompt loop does after one line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// Handle one non-empty input line: a local command, or a turn with the model
async fn process_input<P: LLMProvider>(
    input: &str,
    runner: &mut AgentRunner<P>,
    store: &ConversationStore,
    renderer: &mut AnsiRenderer,
    interactive: bool,
    render_markdown: bool,
) -> Result<Step> {
    match handle_command(input, runner, store, renderer).await? {
        CommandOutcome::Exit => return Ok(Step::Exit),
        CommandOutcome::Handled => return Ok(Step::Continue),
        CommandOutcome::NotCommand => {}
    }

    let outcome = {
        let mut events = TerminalEvents::new(renderer, interactive);
        runner.run_turn(input, &mut events).await
    };
    match outcome {
        Ok(TurnOutcome::Answer(text)) => render_answer(renderer, &text, render_markdown)?,
        Ok(TurnOutcome::Empty) => {
            renderer.line(
                MessageStyle::Warning,
                "The assistant returned an empty response.",
            )?;
        }
        Ok(TurnOutcome::ToolLimit { rounds }) => {
            renderer.line(
                MessageStyle::Warning,
                &format!(
                    "Stopped after {rounds} rounds of tool calls. Ask the assistant to continue if needed."
                ),
            )?;
        }
        Err(err) => {
            info!(error = %format!("{err:#}"), "turn failed");
            renderer.line(MessageStyle::Error, &format!("Error: {err:#}"))?;
        }
    }
    Ok(Step::Continue)
}

pub(crate) async fn run_session<P: LLMProvider>(
    mut runner: AgentRunner<P>,
    config: &AgentConfig,
    scope: &WorkspaceScope,
    load: Option<&str>,
    no_color: bool,
) -> Result<()> {
    let mut renderer = AnsiRenderer::stdout(no_color);
    let interactive = std::io::stdout().is_terminal();
    let store = ConversationStore::new(scope.clone());

    render_welcome(&mut renderer, config, scope, runner.registry())?;
    if let Some(filename) = load {
        load_conversation(filename, &mut runner, &store, &mut renderer).await?;
    }

    let mut editor: Editor<(), DefaultHistory> =
        DefaultEditor::new().context("Failed to create line editor")?;
    let history_path = scope.base_dir().join(&config.ui.history_file);
    load_history(&mut editor, &history_path);

    loop {
        let line = tokio::task::block_in_place(|| editor.readline(PROMPT));
        let input = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                renderer.line(MessageStyle::Info, "Goodbye!")?;
                break;
            }
            Err(err) => {
                save_history(&mut editor, &history_path);
                return Err(err).context("Failed to read input");
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(input) {
            warn!("Failed to add history entry: {e}");
        }

        let step = process_input(
            input,
            &mut runner,
            &store,
            &mut renderer,
            interactive,
            config.ui.render_markdown,
        )
        .await?;
        if matches!(step, Step::Exit) {
            break;
        }
    }

    save_history(&mut editor, &history_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fsagent_core::core::agent::RunnerSettings;
    use fsagent_core::llm::{LLMError, LLMRequest, LLMResponse};
    use fsagent_core::tools::ToolRegistry;
    use std::collections::VecDeque;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct QueuedProvider {
        replies: Arc<Mutex<VecDeque<Result<LLMResponse, LLMError>>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl QueuedProvider {
        fn push(&self, reply: Result<LLMResponse, LLMError>) {
            if let Ok(mut replies) = self.replies.lock() {
                replies.push_back(reply);
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LLMProvider for QueuedProvider {
        fn name(&self) -> &str {
            "queued"
        }

        fn default_model(&self) -> &str {
            "queued-model"
        }

        async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
            if let (Ok(mut prompts), Some(last)) = (self.prompts.lock(), request.messages.last()) {
                prompts.push(last.content.clone());
            }
            self.replies
                .lock()
                .ok()
                .and_then(|mut replies| replies.pop_front())
                .unwrap_or_else(|| Err(LLMError::Provider("nothing queued".into())))
        }
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            self.0
                .lock()
                .map(|inner| String::from_utf8_lossy(&inner).into_owned())
                .unwrap_or_default()
        }
    }

    fn answer(text: &str) -> Result<LLMResponse, LLMError> {
        Ok(LLMResponse {
            content: Some(text.to_string()),
            ..LLMResponse::default()
        })
    }

    #[tokio::test]
    async fn commands_stay_local_and_prose_reaches_the_model() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = WorkspaceScope::new(dir.path().to_path_buf(), None);
        let provider = QueuedProvider::default();
        let mut runner = AgentRunner::new(
            provider.clone(),
            ToolRegistry::new(scope.clone()),
            "system".to_string(),
            RunnerSettings::new("queued-model"),
        );
        let store = ConversationStore::new(scope);
        let capture = Capture::default();
        let mut renderer = AnsiRenderer::with_writer(Box::new(capture.clone()), false);

        let step = process_input("list", &mut runner, &store, &mut renderer, false, false).await?;
        assert_eq!(step, Step::Continue);
        assert!(provider.prompts().is_empty());
        assert!(capture.text().contains("No saved conversations."));

        provider.push(answer("There are no python files."));
        let step = process_input(
            "list the python files",
            &mut runner,
            &store,
            &mut renderer,
            false,
            false,
        )
        .await?;
        assert_eq!(step, Step::Continue);
        assert_eq!(provider.prompts(), vec!["list the python files".to_string()]);
        assert!(capture.text().contains("There are no python files."));
        assert_eq!(runner.messages().len(), 3);

        let step = process_input("/exit", &mut runner, &store, &mut renderer, false, false).await?;
        assert_eq!(step, Step::Exit);
        Ok(())
    }

    #[tokio::test]
    async fn failed_and_empty_turns_are_reported() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = WorkspaceScope::new(dir.path().to_path_buf(), None);
        let provider = QueuedProvider::default();
        provider.push(Err(LLMError::RateLimit));
        provider.push(answer("  "));
        let mut runner = AgentRunner::new(
            provider.clone(),
            ToolRegistry::new(scope.clone()),
            "system".to_string(),
            RunnerSettings::new("queued-model"),
        );
        let store = ConversationStore::new(scope);
        let capture = Capture::default();
        let mut renderer = AnsiRenderer::with_writer(Box::new(capture.clone()), false);

        let step = process_input("hello", &mut runner, &store, &mut renderer, false, false).await?;
        assert_eq!(step, Step::Continue);
        assert!(capture.text().contains("Error: queued request failed"));
        assert_eq!(runner.messages().len(), 1);

        process_input("hello again", &mut runner, &store, &mut renderer, false, false).await?;
        assert!(capture.text().contains("The assistant returned an empty response."));
        Ok(())
    }
}
