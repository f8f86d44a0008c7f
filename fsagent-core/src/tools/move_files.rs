//! Move or rename files and directories, with wildcard sources

use super::traits::{Tool, ToolCategory};
use super::types::{MoveFilesInput, parse_input};
use crate::config::constants::tools;
use crate::workspace::{WorkspaceScope, access_denied};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

#[derive(Clone)]
pub struct MoveFilesTool {
    scope: WorkspaceScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStatus {
    Success,
    Skipped,
    Error,
}

impl ItemStatus {
    fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::Skipped => "skipped",
            ItemStatus::Error => "error",
        }
    }
}

struct ItemOutcome {
    source: PathBuf,
    destination: PathBuf,
    status: ItemStatus,
    message: String,
}

fn has_wildcard(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

impl MoveFilesTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }

    fn expand_sources(pattern: &Path) -> Result<Vec<PathBuf>> {
        let pattern_text = pattern.to_string_lossy();
        let mut sources: Vec<PathBuf> = glob::glob(&pattern_text)
            .map_err(|e| anyhow!("Invalid source pattern '{pattern_text}': {e}"))?
            .filter_map(|entry| entry.ok())
            .collect();
        sources.sort();
        Ok(sources)
    }

    async fn move_item(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
        base_dir: &Path,
    ) -> ItemOutcome {
        let outcome = |status, message: String| ItemOutcome {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            status,
            message,
        };

        if !destination.starts_with(base_dir) {
            return outcome(ItemStatus::Error, crate::workspace::ACCESS_DENIED.to_string());
        }
        if source == destination {
            return outcome(
                ItemStatus::Skipped,
                "Source and destination are the same.".to_string(),
            );
        }
        let source_is_dir = source.is_dir();
        if source_is_dir && destination.starts_with(source) {
            return outcome(
                ItemStatus::Error,
                "Cannot move a directory into itself.".to_string(),
            );
        }

        if let Ok(existing) = fs::symlink_metadata(destination).await {
            if existing.is_dir() != source_is_dir {
                let message = if source_is_dir {
                    "Cannot overwrite a file with a directory."
                } else {
                    "Cannot overwrite a directory with a file."
                };
                return outcome(ItemStatus::Error, message.to_string());
            }
            if !overwrite {
                return outcome(
                    ItemStatus::Skipped,
                    "Destination exists. Set overwrite to true to replace it.".to_string(),
                );
            }
            let removed = if existing.is_dir() {
                fs::remove_dir_all(destination).await
            } else {
                fs::remove_file(destination).await
            };
            if let Err(e) = removed {
                return outcome(
                    ItemStatus::Error,
                    format!("Failed to replace destination: {e}"),
                );
            }
        }

        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                return outcome(
                    ItemStatus::Error,
                    format!("Failed to create destination directory: {e}"),
                );
            }
        }

        match fs::rename(source, destination).await {
            Ok(()) => outcome(ItemStatus::Success, "Moved.".to_string()),
            Err(rename_err) if !source_is_dir => {
                // Cross-device moves need a copy.
                debug!(error = %rename_err, "rename failed, falling back to copy");
                match fs::copy(source, destination).await {
                    Ok(_) => match fs::remove_file(source).await {
                        Ok(()) => outcome(ItemStatus::Success, "Moved.".to_string()),
                        Err(e) => outcome(
                            ItemStatus::Error,
                            format!("Copied but failed to remove source: {e}"),
                        ),
                    },
                    Err(e) => outcome(ItemStatus::Error, format!("Failed to move: {e}")),
                }
            }
            Err(e) => outcome(ItemStatus::Error, format!("Failed to move: {e}")),
        }
    }
}

#[async_trait]
impl Tool for MoveFilesTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: MoveFilesInput = parse_input(self.name(), args)?;
        let source = self.scope.resolve(&input.source_path, input.use_focus_path);
        let destination = self
            .scope
            .resolve(&input.destination_path, input.use_focus_path);
        if !source.inside_base {
            return Ok(access_denied("source_path", &input.source_path));
        }
        if !destination.inside_base {
            return Ok(access_denied("destination_path", &input.destination_path));
        }
        let base_dir = source.base_dir.clone();

        let wildcard = has_wildcard(&input.source_path);
        let sources = if wildcard {
            Self::expand_sources(&source.resolved)?
                .into_iter()
                .filter(|path| path.starts_with(&base_dir) && path != &base_dir)
                .collect::<Vec<_>>()
        } else if source.resolved.exists() {
            vec![source.resolved.clone()]
        } else {
            Vec::new()
        };

        if sources.is_empty() {
            return Ok(json!({
                "source_path": input.source_path,
                "status": "not_found",
                "message": format!("No files or directories match '{}'.", input.source_path),
            }));
        }
        if !wildcard && source.is_base() {
            return Ok(json!({
                "source_path": input.source_path,
                "status": "error",
                "message": "Cannot move the base directory itself.",
            }));
        }

        // Several sources, or an existing directory, mean "move into".
        let into_directory = wildcard || sources.len() > 1 || destination.resolved.is_dir();
        if into_directory && !destination.resolved.exists() {
            fs::create_dir_all(&destination.resolved).await?;
        }

        let mut outcomes = Vec::with_capacity(sources.len());
        for item in &sources {
            let target = if into_directory {
                match item.file_name() {
                    Some(name) => destination.resolved.join(name),
                    None => destination.resolved.clone(),
                }
            } else {
                destination.resolved.clone()
            };
            outcomes.push(
                self.move_item(item, &target, input.overwrite, &base_dir)
                    .await,
            );
        }

        let count = |status: ItemStatus| outcomes.iter().filter(|o| o.status == status).count();
        let (success, errors, skipped) = (
            count(ItemStatus::Success),
            count(ItemStatus::Error),
            count(ItemStatus::Skipped),
        );
        let relative = |path: &Path| {
            pathdiff::diff_paths(path, &base_dir)
                .unwrap_or_else(|| path.to_path_buf())
                .display()
                .to_string()
        };
        let results: Vec<Value> = outcomes
            .iter()
            .map(|o| {
                json!({
                    "source": relative(&o.source),
                    "destination": relative(&o.destination),
                    "status": o.status.as_str(),
                    "message": o.message,
                })
            })
            .collect();

        let status = match (success, errors) {
            (_, 0) => "success",
            (0, _) => "error",
            _ => "partial",
        };
        info!(success, errors, skipped, "move_files finished");

        Ok(json!({
            "source_path": input.source_path,
            "destination_path": input.destination_path,
            "status": status,
            "results": results,
            "summary": {
                "total": outcomes.len(),
                "success": success,
                "errors": errors,
                "skipped": skipped,
            },
        }))
    }

    fn name(&self) -> &str {
        tools::MOVE_FILES
    }

    fn description(&self) -> &str {
        "Moves or renames files and directories. The source may contain wildcards (e.g. 'src/*.txt'); with several sources the destination is treated as a directory. Existing destinations are skipped unless overwrite is true, and a file never replaces a directory or vice versa. Confirm with the user before moving many files."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "File, directory or wildcard pattern to move."
                },
                "destination_path": {
                    "type": "string",
                    "description": "New path, or the directory to move the sources into."
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace existing destinations of the same type (default false)."
                },
                "use_focus_path": {
                    "type": "boolean",
                    "description": "Resolve both paths against the focus directory (default true)."
                }
            },
            "required": ["source_path", "destination_path"]
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

    fn tool(dir: &TempDir) -> MoveFilesTool {
        MoveFilesTool::new(WorkspaceScope::new(dir.path().to_path_buf(), None))
    }

    #[tokio::test]
    async fn renames_single_file() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("old.txt"), "x")?;
        let result = tool(&dir)
            .execute(json!({"source_path": "old.txt", "destination_path": "new/name.txt"}))
            .await?;
        assert_eq!(result["status"], "success");
        assert_eq!(result["summary"]["success"], 1);
        assert!(dir.path().join("new/name.txt").exists());
        assert!(!dir.path().join("old.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn wildcard_moves_into_directory_and_skips_existing() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("out"))?;
        std::fs::write(dir.path().join("a.txt"), "a")?;
        std::fs::write(dir.path().join("b.txt"), "b")?;
        std::fs::write(dir.path().join("out/b.txt"), "old")?;

        let result = tool(&dir)
            .execute(json!({"source_path": "*.txt", "destination_path": "out"}))
            .await?;
        assert_eq!(result["summary"]["total"], 2);
        assert_eq!(result["summary"]["success"], 1);
        assert_eq!(result["summary"]["skipped"], 1);
        assert_eq!(result["status"], "success");
        assert_eq!(std::fs::read_to_string(dir.path().join("out/b.txt"))?, "old");

        let forced = tool(&dir)
            .execute(json!({"source_path": "b.txt", "destination_path": "out", "overwrite": true}))
            .await?;
        assert_eq!(forced["summary"]["success"], 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("out/b.txt"))?, "b");
        Ok(())
    }

    #[tokio::test]
    async fn file_never_replaces_directory() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("target/conflict"))?;
        std::fs::write(dir.path().join("conflict"), "file")?;
        std::fs::create_dir(dir.path().join("other"))?;

        let result = tool(&dir)
            .execute(json!({
                "source_path": "conflict",
                "destination_path": "target",
                "overwrite": true
            }))
            .await?;
        assert_eq!(result["status"], "error");
        assert_eq!(result["summary"]["errors"], 1);
        assert!(dir.path().join("conflict").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_and_escaping_destination() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("f"), "")?;
        let tool = tool(&dir);
        let missing = tool
            .execute(json!({"source_path": "*.none", "destination_path": "x"}))
            .await?;
        assert_eq!(missing["status"], "not_found");

        let escaping = tool
            .execute(json!({"source_path": "f", "destination_path": "../f"}))
            .await?;
        assert_eq!(escaping["status"], "error");
        assert!(dir.path().join("f").exists());
        Ok(())
    }
}
