//! Syntax highlighting and markdown rendering for terminal output

use anstyle_syntect::to_anstyle;
use once_cell::sync::Lazy;
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

const DEFAULT_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME: Lazy<Theme> = Lazy::new(|| {
    let mut defaults = ThemeSet::load_defaults();
    match defaults.themes.remove(DEFAULT_THEME) {
        Some(theme) => theme,
        None => {
            warn!(theme = DEFAULT_THEME, "falling back to first bundled theme");
            defaults.themes.into_values().next().unwrap_or_default()
        }
    }
});

/// Syntax for a language token ("rust", "py", "javascript")
pub fn syntax_for_language(language: Option<&str>) -> &'static SyntaxReference {
    language
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .and_then(|lang| {
            SYNTAX_SET
                .find_syntax_by_token(lang)
                .or_else(|| SYNTAX_SET.find_syntax_by_name(lang))
        })
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Syntax chosen from a file's extension, or its first line when the
/// extension is unknown
pub fn syntax_for_path(path: &Path, first_line: &str) -> &'static SyntaxReference {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| SYNTAX_SET.find_syntax_by_extension(ext))
        .or_else(|| SYNTAX_SET.find_syntax_by_first_line(first_line))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Render code with ANSI colors. Falls back to the raw text if a line cannot
/// be highlighted.
pub fn highlight_code(code: &str, syntax: &SyntaxReference, line_numbers: bool) -> String {
    let mut highlighter = HighlightLines::new(syntax, &THEME);
    let total_lines = code.lines().count().max(1);
    let width = total_lines.to_string().len();
    let number_style = anstyle::Style::new().dimmed();

    let mut out = String::with_capacity(code.len() * 2);
    for (index, line) in LinesWithEndings::from(code).enumerate() {
        if line_numbers {
            out.push_str(&format!(
                "{}{:>width$} │ {}",
                number_style.render(),
                index + 1,
                number_style.render_reset()
            ));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        match highlighter.highlight_line(trimmed, &SYNTAX_SET) {
            Ok(ranges) => {
                for (style, part) in ranges {
                    let style = to_anstyle(style).bg_color(None);
                    out.push_str(&format!("{}{part}{}", style.render(), style.render_reset()));
                }
            }
            Err(_) => out.push_str(trimmed),
        }
        out.push('\n');
    }
    out
}

/// Render markdown for the terminal
pub fn render_markdown(text: &str) -> String {
    let skin = termimad::MadSkin::default();
    skin.term_text(text).to_string()
}
