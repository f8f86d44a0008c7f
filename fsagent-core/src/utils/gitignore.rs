use anyhow::{Result, anyhow};
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path};
use tracing::warn;

use crate::config::constants::paths;

/// Patterns skipped by file search even without a `.gitignore`
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git/",
    "target/",
    "node_modules/",
    "venv/",
    ".venv/",
    "__pycache__/",
    "*.pyc",
    "*.pyo",
    "*.egg-info/",
    "*.egg",
    "dist/",
    "build/",
    ".env",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Ordered gitignore rules; the last matching rule decides
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    negated: bool,
    /// Trailing `/`: only directories match
    dir_only: bool,
    /// Contains an inner `/`: matched against the path from the root
    anchored: bool,
}

impl IgnoreRules {
    pub fn defaults() -> Self {
        let mut rules = Self::default();
        for line in DEFAULT_IGNORE_PATTERNS {
            if let Err(err) = rules.add_line(line) {
                warn!("skipping built-in ignore pattern: {err}");
            }
        }
        rules
    }

    /// Defaults followed by the `.gitignore` found directly in `root`
    pub fn for_directory(root: &Path) -> Self {
        let mut rules = Self::defaults();
        let gitignore_path = root.join(paths::GITIGNORE_FILE);
        if let Ok(content) = std::fs::read_to_string(&gitignore_path) {
            for (line_num, line) in content.lines().enumerate() {
                if let Err(err) = rules.add_line(line) {
                    warn!(
                        file = %gitignore_path.display(),
                        line = line_num + 1,
                        "ignoring invalid pattern: {err}"
                    );
                }
            }
        }
        rules
    }

    /// Parse one gitignore line. Blank lines and comments are accepted and
    /// produce no rule.
    pub fn add_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let (body, negated) = match line.strip_prefix('!') {
            Some(stripped) => (stripped, true),
            None => (line, false),
        };
        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Ok(());
        }

        let pattern =
            Pattern::new(body).map_err(|e| anyhow!("Invalid pattern '{line}': {e}"))?;
        self.rules.push(IgnoreRule {
            pattern,
            negated,
            dir_only,
            anchored,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check a path relative to the rules' root directory
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        let parts: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return false;
        }

        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(&parts, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

impl IgnoreRule {
    fn matches(&self, parts: &[String], is_dir: bool) -> bool {
        let last = parts.len() - 1;
        // Directory-only rules may match any ancestor, or the entry itself when it is a directory.
        let eligible = |index: usize| !self.dir_only || index < last || is_dir;

        if self.anchored {
            (0..parts.len()).filter(|i| eligible(*i)).any(|i| {
                let prefix = parts[..=i].join("/");
                self.pattern.matches_with(&prefix, MATCH_OPTIONS)
            })
        } else {
            parts
                .iter()
                .enumerate()
                .filter(|(i, _)| eligible(*i))
                .any(|(_, part)| self.pattern.matches_with(part, MATCH_OPTIONS))
        }
    }
}
