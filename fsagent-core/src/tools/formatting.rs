//! Terminal formatting tools: syntax highlighting and rich output

use super::traits::{Tool, ToolCategory};
use super::types::{RichFormat, RichOutputInput, SyntaxHighlightInput, parse_input};
use crate::config::constants::tools;
use crate::ui::highlight::{highlight_code, render_markdown, syntax_for_language, syntax_for_path};
use crate::workspace::{WorkspaceScope, access_denied};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::io::ErrorKind;

/// Highlight a file from the workspace
#[derive(Clone)]
pub struct SyntaxHighlightTool {
    scope: WorkspaceScope,
}

impl SyntaxHighlightTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for SyntaxHighlightTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: SyntaxHighlightInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.file_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("file_path", &input.file_path));
        }

        let bytes = match tokio::fs::read(&path.resolved).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(json!({
                    "file_path": input.file_path,
                    "status": "not_found",
                    "message": format!("File '{}' not found.", path.relative_display()),
                }));
            }
            Err(e) if path.resolved.is_dir() => {
                return Ok(json!({
                    "file_path": input.file_path,
                    "status": "error",
                    "message": format!("Path '{}' is not a file: {e}", path.relative_display()),
                }));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.resolved.display()));
            }
        };
        let code = String::from_utf8_lossy(&bytes);
        let first_line = code.lines().next().unwrap_or_default();
        let syntax = syntax_for_path(&path.resolved, first_line);

        Ok(json!({
            "file_path": input.file_path,
            "status": "success",
            "language": syntax.name,
            "highlighted": highlight_code(&code, syntax, input.line_numbers),
        }))
    }

    fn name(&self) -> &str {
        tools::SYNTAX_HIGHLIGHT
    }

    fn description(&self) -> &str {
        "Returns the content of a file with ANSI syntax highlighting, detected from the file extension. Useful for showing code to the user."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to highlight."
                },
                "line_numbers": {
                    "type": "boolean",
                    "description": "Prefix each line with its number (default true)."
                },
                "use_focus_path": {
                    "type": "boolean",
                    "description": "Resolve the path against the focus directory (default true)."
                }
            },
            "required": ["file_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Formatting
    }
}

/// Draw text inside a box with an optional title
pub fn render_panel(content: &str, title: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let inner = content
        .lines()
        .map(|line| line.chars().count())
        .chain(title.map(|t| t.chars().count() + 2))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    match title {
        Some(title) => {
            let fill = inner.saturating_sub(title.chars().count() + 2);
            out.push_str(&format!("╭─ {title} {}─╮\n", "─".repeat(fill)));
        }
        None => out.push_str(&format!("╭{}╮\n", "─".repeat(inner + 2))),
    }
    for line in content.lines() {
        let pad = inner - line.chars().count();
        out.push_str(&format!("│ {line}{} │\n", " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯\n", "─".repeat(inner + 2)));
    out
}

/// Render text as markdown, highlighted code or a panel
#[derive(Clone, Default)]
pub struct RichOutputTool;

impl RichOutputTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for RichOutputTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: RichOutputInput = parse_input(self.name(), args)?;
        let rendered = match input.format_type {
            RichFormat::Markdown => render_markdown(&input.content),
            RichFormat::Code => {
                highlight_code(&input.content, syntax_for_language(input.language.as_deref()), false)
            }
            RichFormat::Syntax => {
                highlight_code(&input.content, syntax_for_language(input.language.as_deref()), true)
            }
            RichFormat::Panel => render_panel(&input.content, input.title.as_deref()),
        };

        Ok(json!({
            "status": "success",
            "format_type": format!("{:?}", input.format_type).to_lowercase(),
            "rendered": rendered,
        }))
    }

    fn name(&self) -> &str {
        tools::RICH_OUTPUT
    }

    fn description(&self) -> &str {
        "Renders content for the terminal as markdown, highlighted code, numbered code ('syntax') or a titled panel."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Text to render."
                },
                "format_type": {
                    "type": "string",
                    "enum": ["markdown", "code", "syntax", "panel"],
                    "description": "How to render the content (default markdown)."
                },
                "language": {
                    "type": "string",
                    "description": "Language for code and syntax formats, e.g. 'python'."
                },
                "title": {
                    "type": "string",
                    "description": "Title for the panel format."
                }
            },
            "required": ["content"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Formatting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn panel_fits_longest_line_and_title() {
        let panel = render_panel("a\nlonger line", Some("Title"));
        let lines: Vec<&str> = panel.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Title"));
        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[tokio::test]
    async fn highlights_workspace_file() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n")?;
        let tool = SyntaxHighlightTool::new(WorkspaceScope::new(dir.path().to_path_buf(), None));

        let result = tool.execute(json!({"file_path": "main.rs"})).await?;
        assert_eq!(result["status"], "success");
        assert_eq!(result["language"], "Rust");
        assert!(result["highlighted"].as_str().unwrap_or_default().contains("main"));

        let missing = tool.execute(json!({"file_path": "nope.rs"})).await?;
        assert_eq!(missing["status"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn rich_output_formats() -> Result<()> {
        let tool = RichOutputTool::new();
        let panel = tool
            .execute(json!({"content": "hello", "format_type": "panel", "title": "Note"}))
            .await?;
        assert_eq!(panel["format_type"], "panel");
        assert!(panel["rendered"].as_str().unwrap_or_default().contains("Note"));

        let markdown = tool.execute(json!({"content": "# Heading"})).await?;
        assert_eq!(markdown["format_type"], "markdown");
        assert!(markdown["rendered"].as_str().unwrap_or_default().contains("Heading"));

        let bad = tool.execute(json!({"content": "x", "format_type": "html"})).await;
        assert!(bad.is_err());
        Ok(())
    }
}
