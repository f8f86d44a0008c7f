use anyhow::Result;
use fsagent_core::config::AgentConfig;
use fsagent_core::tools::ToolRegistry;
use fsagent_core::ui::render_tool_table;
use fsagent_core::utils::ansi::{AnsiRenderer, MessageStyle};
use fsagent_core::workspace::WorkspaceScope;

pub(crate) fn render_welcome(
    renderer: &mut AnsiRenderer,
    config: &AgentConfig,
    scope: &WorkspaceScope,
    registry: &ToolRegistry,
) -> Result<()> {
    renderer.line(
        MessageStyle::User,
        &format!("fsagent v{}", env!("CARGO_PKG_VERSION")),
    )?;
    renderer.line(MessageStyle::Info, &format!("Model: {}", config.agent.model))?;
    match scope.focus() {
        Some(focus) => renderer.line(
            MessageStyle::Info,
            &format!("Focus directory: {}", focus.display()),
        )?,
        None => renderer.line(
            MessageStyle::Info,
            &format!("Working directory: {}", scope.cwd().display()),
        )?,
    }
    renderer.line(
        MessageStyle::Info,
        &format!("{} tools available", registry.len()),
    )?;
    if config.ui.show_tool_table {
        renderer.blank()?;
        renderer.raw(&render_tool_table(&registry.entries()))?;
    }
    renderer.blank()?;
    renderer.line(
        MessageStyle::Info,
        "Type 'help' for commands, 'exit' or Ctrl-D to quit.",
    )?;
    renderer.blank()
}
