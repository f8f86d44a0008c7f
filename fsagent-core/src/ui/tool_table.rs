//! Tool listing grouped by category

use crate::tools::{ToolCategory, ToolEntry};
use anstyle::{AnsiColor, Style};
use std::fmt::Write as _;

const DESCRIPTION_WIDTH: usize = 72;

fn first_sentence(text: &str) -> String {
    let sentence = match text.find(". ") {
        Some(end) => &text[..=end],
        None => text,
    };
    if sentence.chars().count() > DESCRIPTION_WIDTH {
        let truncated: String = sentence.chars().take(DESCRIPTION_WIDTH - 1).collect();
        format!("{truncated}…")
    } else {
        sentence.to_string()
    }
}

/// Render the tool table. Styles are emitted unconditionally; the renderer
/// strips them when color is off.
pub fn render_tool_table(entries: &[ToolEntry]) -> String {
    let heading = Style::new().bold().fg_color(Some(AnsiColor::Blue.into()));
    let name_style = Style::new().fg_color(Some(AnsiColor::Cyan.into()));
    let width = entries
        .iter()
        .map(|entry| entry.name.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for category in ToolCategory::ALL {
        let group: Vec<&ToolEntry> = entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "{}{category} ({}){}",
            heading.render(),
            group.len(),
            heading.render_reset()
        );
        for entry in group {
            let _ = writeln!(
                out,
                "  {}{:<width$}{}  {}",
                name_style.render(),
                entry.name,
                name_style.render_reset(),
                first_sentence(&entry.description)
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, category: ToolCategory, description: &str) -> ToolEntry {
        ToolEntry {
            name: name.into(),
            category,
            description: description.into(),
        }
    }

    #[test]
    fn groups_by_category_in_fixed_order() {
        let table = render_tool_table(&[
            entry("git_status", ToolCategory::Git, "Shows status."),
            entry("read_file_content", ToolCategory::FileOperations, "Reads. More text."),
        ]);
        let files = table.find("File Operations (1)");
        let git = table.find("Git (1)");
        assert!(files.is_some() && git.is_some());
        assert!(files < git);
        assert!(table.contains("Reads."));
        assert!(!table.contains("More text"));
        assert!(!table.contains("Custom"));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "x".repeat(200);
        assert_eq!(first_sentence(&long).chars().count(), DESCRIPTION_WIDTH);
    }
}
