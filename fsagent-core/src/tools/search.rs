//! Filename search with gitignore filtering

use super::traits::{Tool, ToolCategory};
use super::types::{SearchFilesInput, parse_input};
use crate::config::constants::tools;
use crate::utils::gitignore::IgnoreRules;
use crate::workspace::{WorkspaceScope, access_denied};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MAX_RESULTS: usize = 1000;

#[derive(Clone)]
pub struct SearchFilesTool {
    scope: WorkspaceScope,
}

struct SearchOutcome {
    matches: Vec<String>,
    truncated: bool,
}

impl SearchFilesTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }

    fn search(
        root: &Path,
        base_dir: &Path,
        pattern: &Pattern,
        match_full_path: bool,
        rules: Option<&IgnoreRules>,
    ) -> SearchOutcome {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: match_full_path,
            require_literal_leading_dot: false,
        };
        let relative_to_base =
            |path: &Path| path.strip_prefix(base_dir).map(Path::to_path_buf).ok();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let Some(rules) = rules else { return true };
                match relative_to_base(entry.path()) {
                    Some(relative) => !rules.is_ignored(&relative, entry.file_type().is_dir()),
                    None => true,
                }
            });

        let mut matches = Vec::new();
        let mut truncated = false;
        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative: PathBuf =
                relative_to_base(entry.path()).unwrap_or_else(|| entry.path().to_path_buf());
            let candidate = if match_full_path {
                relative.to_string_lossy().into_owned()
            } else {
                entry.file_name().to_string_lossy().into_owned()
            };
            if pattern.matches_with(&candidate, options) {
                if matches.len() >= MAX_RESULTS {
                    truncated = true;
                    break;
                }
                matches.push(relative.to_string_lossy().into_owned());
            }
        }

        SearchOutcome { matches, truncated }
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: SearchFilesInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.search_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("search_path", &input.search_path));
        }
        if !path.resolved.is_dir() {
            return Ok(json!({
                "search_path": input.search_path,
                "status": "not_found",
                "message": format!("Directory '{}' not found.", path.relative_display()),
            }));
        }

        let pattern_text = if input.file_pattern.trim().is_empty() {
            "*".to_string()
        } else {
            input.file_pattern.trim().to_string()
        };
        let pattern = Pattern::new(&pattern_text)
            .map_err(|e| anyhow!("Invalid file_pattern '{pattern_text}': {e}"))?;
        let match_full_path = pattern_text.contains('/');

        let base_dir = path.base_dir.clone();
        let root = path.resolved.clone();
        let respect_gitignore = input.respect_gitignore;
        let outcome = tokio::task::spawn_blocking(move || {
            let rules = respect_gitignore.then(|| IgnoreRules::for_directory(&base_dir));
            Self::search(&root, &base_dir, &pattern, match_full_path, rules.as_ref())
        })
        .await
        .context("File search task failed")?;

        let mut result = json!({
            "search_path": input.search_path,
            "file_pattern": pattern_text,
            "status": "success",
            "count": outcome.matches.len(),
            "matches": outcome.matches,
        });
        if outcome.truncated {
            result["truncated"] = json!(true);
            result["message"] = json!(format!(
                "Showing the first {MAX_RESULTS} matches. Narrow the pattern or search path."
            ));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        tools::SEARCH_FILES
    }

    fn description(&self) -> &str {
        "Recursively finds files whose name matches a glob pattern (e.g. '*.py'). Patterns containing '/' match the path relative to the base directory. Ignored files (.gitignore plus common build and VCS folders) are skipped by default."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search_path": {
                    "type": "string",
                    "description": "Directory to search from (default '.')."
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Glob pattern such as '*.rs', 'test_*' or 'src/**/*.js' (default '*')."
                },
                "respect_gitignore": {
                    "type": "boolean",
                    "description": "Skip files excluded by .gitignore and default patterns (default true)."
                },
                "use_focus_path": {
                    "type": "boolean",
                    "description": "Resolve search_path against the focus directory (default true)."
                }
            }
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

    fn fixture() -> Result<TempDir> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("src/nested"))?;
        std::fs::create_dir_all(dir.path().join("target/debug"))?;
        std::fs::write(dir.path().join("src/main.rs"), "")?;
        std::fs::write(dir.path().join("src/nested/lib.rs"), "")?;
        std::fs::write(dir.path().join("target/debug/build.rs"), "")?;
        std::fs::write(dir.path().join("notes.md"), "")?;
        std::fs::write(dir.path().join("skip.rs"), "")?;
        std::fs::write(dir.path().join(".gitignore"), "skip.rs\n")?;
        Ok(dir)
    }

    #[tokio::test]
    async fn finds_by_name_and_honours_ignore_rules() -> Result<()> {
        let dir = fixture()?;
        let tool = SearchFilesTool::new(WorkspaceScope::new(dir.path().to_path_buf(), None));

        let result = tool.execute(json!({"file_pattern": "*.rs"})).await?;
        let matches: Vec<&str> = result["matches"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        assert_eq!(matches, vec!["src/main.rs", "src/nested/lib.rs"]);

        let everything = tool
            .execute(json!({"file_pattern": "*.rs", "respect_gitignore": false}))
            .await?;
        assert_eq!(everything["count"], 4);
        Ok(())
    }

    #[tokio::test]
    async fn path_patterns_and_subdirectories() -> Result<()> {
        let dir = fixture()?;
        let tool = SearchFilesTool::new(WorkspaceScope::new(dir.path().to_path_buf(), None));

        let nested = tool
            .execute(json!({"search_path": "src", "file_pattern": "src/nested/*"}))
            .await?;
        assert_eq!(nested["matches"][0], "src/nested/lib.rs");
        assert_eq!(nested["count"], 1);

        let missing = tool.execute(json!({"search_path": "nope"})).await?;
        assert_eq!(missing["status"], "not_found");
        Ok(())
    }
}
