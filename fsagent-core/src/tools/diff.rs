//! Unified diff between a file on disk and proposed content

use super::traits::{Tool, ToolCategory};
use super::types::{ProposedDiffInput, parse_input};
use crate::config::constants::tools;
use crate::workspace::{WorkspaceScope, access_denied};
use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;
use std::io::ErrorKind;

const CONTEXT_LINES: usize = 3;

/// Counts of changed lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

/// Build a unified diff with `a/` and `b/` headers. Returns an empty string
/// when the inputs are identical.
pub fn unified_diff(path: &str, old: &str, new: &str) -> (String, DiffStats) {
    let diff = TextDiff::from_lines(old, new);
    let mut stats = DiffStats::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.additions += 1,
            ChangeTag::Delete => stats.deletions += 1,
            ChangeTag::Equal => {}
        }
    }
    if stats.additions == 0 && stats.deletions == 0 {
        return (String::new(), stats);
    }

    let text = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string();
    (text, stats)
}

/// Color a unified diff for the terminal: additions green, deletions red,
/// hunk headers cyan.
pub fn colorize_diff(diff: &str) -> String {
    let added = Style::new().fg_color(Some(AnsiColor::Green.into()));
    let removed = Style::new().fg_color(Some(AnsiColor::Red.into()));
    let hunk = Style::new().fg_color(Some(AnsiColor::Cyan.into()));
    let header = Style::new().bold();

    let mut out = String::with_capacity(diff.len() + diff.len() / 4);
    for line in diff.lines() {
        let style = if line.starts_with("+++") || line.starts_with("---") {
            header
        } else if line.starts_with('+') {
            added
        } else if line.starts_with('-') {
            removed
        } else if line.starts_with("@@") {
            hunk
        } else {
            Style::new()
        };
        let _ = writeln!(out, "{}{line}{}", style.render(), style.render_reset());
    }
    out
}

#[derive(Clone)]
pub struct ProposedDiffTool {
    scope: WorkspaceScope,
}

impl ProposedDiffTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for ProposedDiffTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: ProposedDiffInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.file_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("file_path", &input.file_path));
        }
        if path.resolved.is_dir() {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "error",
                "message": format!("Path '{}' is a directory.", path.relative_display()),
            }));
        }

        let (original, new_file) = match tokio::fs::read(&path.resolved).await {
            Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), false),
            Err(e) if e.kind() == ErrorKind::NotFound => (String::new(), true),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.resolved.display()));
            }
        };

        let display_path = path.relative_display();
        let (diff, stats) = unified_diff(&display_path, &original, &input.proposed_new_content);
        if diff.is_empty() {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "no_change",
                "message": "The proposed content is identical to the current file.",
            }));
        }

        Ok(json!({
            "file_path": input.file_path,
            "status": "success",
            "new_file": new_file,
            "additions": stats.additions,
            "deletions": stats.deletions,
            "diff": diff,
        }))
    }

    fn name(&self) -> &str {
        tools::GET_DIFF_FOR_PROPOSED_CHANGES
    }

    fn description(&self) -> &str {
        "Shows a unified diff between a file's current content and proposed new content without changing anything. Present the diff to the user and ask for confirmation before calling write_to_file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file that would change. A missing file diffs against empty content."
                },
                "proposed_new_content": {
                    "type": "string",
                    "description": "The full proposed content of the file."
                },
                "use_focus_path": {
                    "type": "boolean",
                    "description": "Resolve the path against the focus directory (default true)."
                }
            },
            "required": ["file_path", "proposed_new_content"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn identical_content_has_no_diff() {
        let (diff, stats) = unified_diff("x", "a\nb\n", "a\nb\n");
        assert!(diff.is_empty());
        assert_eq!(stats, DiffStats::default());
    }

    #[test]
    fn diff_has_headers_and_counts() {
        let (diff, stats) = unified_diff("src/lib.rs", "a\nb\nc\n", "a\nB\nc\nd\n");
        assert!(diff.contains("--- a/src/lib.rs"));
        assert!(diff.contains("+++ b/src/lib.rs"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+B"));
        assert_eq!(stats.additions, 2);
        assert_eq!(stats.deletions, 1);
    }

    #[test]
    fn colorized_diff_keeps_text() {
        let colored = colorize_diff("@@ -1 +1 @@\n-old\n+new\n");
        assert!(colored.contains("old"));
        assert!(colored.contains("new"));
        assert!(colored.contains("\u{1b}["));
    }

    #[tokio::test]
    async fn tool_reports_no_change_and_new_files() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("same.txt"), "x\n")?;
        let tool = ProposedDiffTool::new(WorkspaceScope::new(dir.path().to_path_buf(), None));

        let same = tool
            .execute(json!({"file_path": "same.txt", "proposed_new_content": "x\n"}))
            .await?;
        assert_eq!(same["status"], "no_change");

        let fresh = tool
            .execute(json!({"file_path": "new.txt", "proposed_new_content": "hello\n"}))
            .await?;
        assert_eq!(fresh["status"], "success");
        assert_eq!(fresh["new_file"], true);
        assert_eq!(fresh["additions"], 1);
        assert!(!dir.path().join("new.txt").exists());
        Ok(())
    }
}
