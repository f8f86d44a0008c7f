use anyhow::Result;
use fsagent_core::conversation::{ConversationError, ConversationStore};
use fsagent_core::core::agent::AgentRunner;
use fsagent_core::llm::LLMProvider;
use fsagent_core::ui::render_tool_table;
use fsagent_core::utils::ansi::{AnsiRenderer, MessageStyle};

/// Local commands intercepted before input reaches the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Exit,
    Save(Option<String>),
    Load(Option<String>),
    Clear,
    Help,
    Tools,
    List,
}

pub(crate) enum CommandOutcome {
    /// Input was not a command and goes to the model
    NotCommand,
    Handled,
    Exit,
}

const COMMANDS: &[(&str, &str)] = &[
    ("exit, quit", "End the session"),
    ("save [file]", "Save the conversation (alias: dump)"),
    ("load <file>", "Load a saved conversation"),
    ("list", "List saved conversations"),
    ("clear", "Start over, keeping only the system prompt"),
    ("tools", "Show the available tools"),
    ("help", "Show this help"),
];

/// Parse a command, case-insensitively and with an optional leading slash.
///
/// `save`, `dump` and `load` take at most one argument, which keeps its case.
/// Every other command must be the whole input, so prose such as "list the
/// python files" goes to the model.
pub(crate) fn parse_command(input: &str) -> Option<Command> {
    let mut parts = input.split_whitespace();
    let word = parts.next()?;
    let word = word.strip_prefix('/').unwrap_or(word).to_lowercase();
    let argument = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return None;
    }

    match (word.as_str(), argument) {
        ("save" | "dump", argument) => Some(Command::Save(argument)),
        ("load", argument) => Some(Command::Load(argument)),
        (_, Some(_)) => None,
        ("exit" | "quit", None) => Some(Command::Exit),
        ("clear", None) => Some(Command::Clear),
        ("help", None) => Some(Command::Help),
        ("tools", None) => Some(Command::Tools),
        ("list", None) => Some(Command::List),
        _ => None,
    }
}

pub(crate) fn render_help(renderer: &mut AnsiRenderer) -> Result<()> {
    renderer.line(MessageStyle::Info, "Available commands:")?;
    let width = COMMANDS.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    for (usage, description) in COMMANDS {
        renderer.line(MessageStyle::Info, &format!("  {usage:<width$}  {description}"))?;
    }
    renderer.line(
        MessageStyle::Info,
        "Anything else is sent to the assistant. Commands may start with '/'.",
    )?;
    Ok(())
}

pub(crate) async fn handle_command<P: LLMProvider>(
    input: &str,
    runner: &mut AgentRunner<P>,
    store: &ConversationStore,
    renderer: &mut AnsiRenderer,
) -> Result<CommandOutcome> {
    let Some(command) = parse_command(input) else {
        return Ok(CommandOutcome::NotCommand);
    };

    match command {
        Command::Exit => {
            renderer.line(MessageStyle::Info, "Goodbye!")?;
            return Ok(CommandOutcome::Exit);
        }
        Command::Save(filename) => {
            match store
                .save(runner.messages(), filename.as_deref(), runner.model())
                .await
            {
                Ok(saved) => renderer.line(
                    MessageStyle::Info,
                    &format!(
                        "Conversation saved to {} ({} messages)",
                        saved.path.display(),
                        saved.message_count
                    ),
                )?,
                Err(err) => renderer.line(
                    MessageStyle::Error,
                    &format!("Error saving conversation: {err}"),
                )?,
            }
        }
        Command::Load(None) => {
            renderer.line(MessageStyle::Error, "Please provide a filename to load")?;
        }
        Command::Load(Some(filename)) => {
            load_conversation(&filename, runner, store, renderer).await?;
        }
        Command::Clear => {
            runner.clear();
            renderer.line(MessageStyle::Info, "Conversation cleared.")?;
        }
        Command::Help => render_help(renderer)?,
        Command::Tools => {
            renderer.raw(&render_tool_table(&runner.registry().entries()))?;
        }
        Command::List => match store.list().await {
            Ok(saved) if saved.is_empty() => {
                renderer.line(MessageStyle::Info, "No saved conversations.")?;
            }
            Ok(saved) => {
                renderer.line(MessageStyle::Info, "Saved conversations (newest first):")?;
                for item in saved {
                    renderer.line(
                        MessageStyle::Info,
                        &format!(
                            "  {}  {}",
                            item.modified.format("%Y-%m-%d %H:%M"),
                            item.name
                        ),
                    )?;
                }
            }
            Err(err) => renderer.line(
                MessageStyle::Error,
                &format!("Error listing conversations: {err}"),
            )?,
        },
    }
    Ok(CommandOutcome::Handled)
}

/// Replace the runner's history with a saved conversation
pub(crate) async fn load_conversation<P: LLMProvider>(
    filename: &str,
    runner: &mut AgentRunner<P>,
    store: &ConversationStore,
    renderer: &mut AnsiRenderer,
) -> Result<bool> {
    match store.load(filename).await {
        Ok(loaded) => {
            let model = loaded
                .metadata
                .as_ref()
                .and_then(|meta| meta.model.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let count = loaded.messages.len();
            runner.replace_history(loaded.messages);
            renderer.line(
                MessageStyle::Info,
                &format!(
                    "Conversation loaded from {} ({count} messages, model: {model})",
                    loaded.path.display()
                ),
            )?;
            Ok(true)
        }
        Err(err @ ConversationError::NotFound { .. }) => {
            renderer.line(MessageStyle::Error, &err.to_string())?;
            Ok(false)
        }
        Err(err) => {
            renderer.line(
                MessageStyle::Error,
                &format!("Error loading conversation: {err}"),
            )?;
            Ok(false)
        }
    }
}
