use anyhow::Result;
use fsagent_core::core::agent::TurnEvents;
use fsagent_core::tools::diff::colorize_diff;
use fsagent_core::ui::highlight::{highlight_code, render_markdown, syntax_for_language};
use fsagent_core::ui::Spinner;
use fsagent_core::utils::ansi::{AnsiRenderer, MessageStyle};
use serde_json::Value;
use tracing::debug;

const MAX_RESULT_LINES: usize = 20;

/// Render the final answer, as markdown when it contains a fenced code block
pub(crate) fn render_answer(renderer: &mut AnsiRenderer, text: &str, markdown: bool) -> Result<()> {
    renderer.blank()?;
    if markdown && text.contains("```") {
        renderer.raw(&render_markdown(text))?;
    } else {
        renderer.line(MessageStyle::Response, text)?;
    }
    renderer.blank()
}

fn truncate_lines(text: &str, max_lines: usize) -> String {
    let total = text.lines().count();
    if total <= max_lines {
        return text.to_string();
    }
    let mut kept: Vec<&str> = text.lines().take(max_lines).collect();
    let omitted = format!("… {} more lines", total - max_lines);
    kept.push(&omitted);
    kept.join("\n")
}

/// Turn events drawn on the terminal
pub(crate) struct TerminalEvents<'a> {
    renderer: &'a mut AnsiRenderer,
    spinner: Option<Spinner>,
    interactive: bool,
}

impl<'a> TerminalEvents<'a> {
    pub(crate) fn new(renderer: &'a mut AnsiRenderer, interactive: bool) -> Self {
        Self {
            renderer,
            spinner: None,
            interactive,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn render_tool_call(&mut self, name: &str, arguments: &str) -> Result<()> {
        self.renderer
            .line(MessageStyle::Tool, &format!("[tool] {name}"))?;
        let pretty = serde_json::from_str::<Value>(arguments)
            .and_then(|value| serde_json::to_string_pretty(&value))
            .unwrap_or_else(|_| arguments.to_string());
        if pretty.trim().is_empty() || pretty.trim() == "{}" {
            return Ok(());
        }
        let shown = truncate_lines(&pretty, MAX_RESULT_LINES);
        self.renderer
            .raw(&highlight_code(&shown, syntax_for_language(Some("json")), false))
    }

    fn render_tool_result(&mut self, name: &str, result: &Value) -> Result<()> {
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or(if result.get("error").is_some() { "error" } else { "done" });
        let style = if status == "error" {
            MessageStyle::Error
        } else {
            MessageStyle::Output
        };

        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return self
                .renderer
                .line(style, &format!("{name} failed: {error}"));
        }
        if let Some(diff) = result.get("diff").and_then(Value::as_str) {
            self.renderer.line(style, &format!("{name}: {status}"))?;
            return self.renderer.raw(&colorize_diff(diff));
        }
        for key in ["highlighted", "rendered"] {
            if let Some(text) = result.get(key).and_then(Value::as_str) {
                return self.renderer.raw(text);
            }
        }
        if let Some(message) = result.get("message").and_then(Value::as_str) {
            return self
                .renderer
                .line(style, &format!("{name}: {status}: {message}"));
        }

        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        self.renderer.line(style, &format!("{name}: {status}"))?;
        self.renderer
            .line(MessageStyle::Output, &truncate_lines(&pretty, MAX_RESULT_LINES))
    }
}

impl TurnEvents for TerminalEvents<'_> {
    fn on_request_start(&mut self) {
        if self.interactive {
            self.spinner = Some(Spinner::new("Assistant is thinking..."));
        }
    }

    fn on_request_end(&mut self) {
        self.stop_spinner();
    }

    fn on_assistant_note(&mut self, text: &str) {
        if let Err(e) = self.renderer.line(MessageStyle::Response, text) {
            debug!(error = %e, "failed to render assistant note");
        }
    }

    fn on_tool_call(&mut self, name: &str, arguments: &str) {
        self.stop_spinner();
        if let Err(e) = self.render_tool_call(name, arguments) {
            debug!(error = %e, "failed to render tool call");
        }
    }

    fn on_tool_result(&mut self, name: &str, result: &Value) {
        if let Err(e) = self.render_tool_result(name, result) {
            debug!(error = %e, "failed to render tool result");
        }
    }
}

impl Drop for TerminalEvents<'_> {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}
