//! File and directory tools scoped to the base directory

use super::traits::{Tool, ToolCategory};
use super::types::{
    CreateEmptyFileInput, DeleteDirectoryInput, DirectoryInput, ListDirectoryInput,
    ReadFileInput, WriteFileInput, parse_input,
};
use crate::config::constants::tools;
use crate::workspace::{WorkspaceScope, access_denied};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, info};

fn use_focus_path_property() -> Value {
    json!({
        "type": "boolean",
        "description": "Resolve the path against the focus directory (default true). Set false to use the working directory."
    })
}

/// Read a text file
#[derive(Clone)]
pub struct ReadFileTool {
    scope: WorkspaceScope,
}

impl ReadFileTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: ReadFileInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.file_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("file_path", &input.file_path));
        }

        let metadata = match fs::metadata(&path.resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(json!({
                    "file_path": input.file_path,
                    "status": "not_found",
                    "message": format!("File '{}' not found.", path.relative_display()),
                }));
            }
            Err(e) => return Err(e).context("Failed to inspect file"),
        };
        if !metadata.is_file() {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "error",
                "message": format!("Path '{}' is not a file.", path.relative_display()),
            }));
        }

        let bytes = fs::read(&path.resolved)
            .await
            .with_context(|| format!("Failed to read {}", path.resolved.display()))?;
        match String::from_utf8(bytes) {
            Ok(content) => Ok(json!({
                "file_path": input.file_path,
                "content": content,
                "status": "success",
            })),
            Err(_) => Ok(json!({
                "file_path": input.file_path,
                "status": "error",
                "message": "File is not valid UTF-8 text.",
            })),
        }
    }

    fn name(&self) -> &str {
        tools::READ_FILE_CONTENT
    }

    fn description(&self) -> &str {
        "Reads and returns the full text content of a file. Use this before proposing changes to an existing file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read, e.g. 'src/main.py'."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["file_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// Write (create or overwrite) a text file
#[derive(Clone)]
pub struct WriteFileTool {
    scope: WorkspaceScope,
}

impl WriteFileTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: WriteFileInput = parse_input(self.name(), args)?;
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

        if let Some(parent) = path.resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path.resolved, input.content.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.resolved.display()))?;

        info!(path = %path.resolved.display(), bytes = input.content.len(), "wrote file");
        Ok(json!({
            "file_path": input.file_path,
            "status": "success",
            "bytes_written": input.content.len(),
            "message": format!("Content written to '{}'.", path.relative_display()),
        }))
    }

    fn name(&self) -> &str {
        tools::WRITE_TO_FILE
    }

    fn description(&self) -> &str {
        "Writes content to a file, creating parent directories as needed and overwriting any existing content. Only call this after the user has confirmed a proposed diff."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The complete new content of the file."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["file_path", "content"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// Create an empty file
#[derive(Clone)]
pub struct CreateEmptyFileTool {
    scope: WorkspaceScope,
}

impl CreateEmptyFileTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for CreateEmptyFileTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: CreateEmptyFileInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.file_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("file_path", &input.file_path));
        }

        if path.resolved.is_dir() {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "error",
                "message": format!("Path '{}' is an existing directory.", path.relative_display()),
            }));
        }
        if path.resolved.exists() && !input.overwrite {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "exists",
                "message": format!(
                    "File '{}' already exists. Set overwrite to true to truncate it.",
                    path.relative_display()
                ),
            }));
        }

        if let Some(parent) = path.resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path.resolved, b"")
            .await
            .with_context(|| format!("Failed to create {}", path.resolved.display()))?;

        Ok(json!({
            "file_path": input.file_path,
            "status": "success",
            "message": format!("Empty file '{}' created.", path.relative_display()),
        }))
    }

    fn name(&self) -> &str {
        tools::CREATE_EMPTY_FILE
    }

    fn description(&self) -> &str {
        "Creates an empty file. Existing files are left untouched unless overwrite is true."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to create."
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Truncate the file if it already exists (default false)."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["file_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// Create a directory and any missing parents
#[derive(Clone)]
pub struct CreateDirectoryTool {
    scope: WorkspaceScope,
}

impl CreateDirectoryTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for CreateDirectoryTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: DirectoryInput = parse_input(self.name(), args)?;
        let path = self
            .scope
            .resolve(&input.directory_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("directory_path", &input.directory_path));
        }

        if path.resolved.is_dir() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "exists",
                "message": format!("Directory '{}' already exists.", path.relative_display()),
            }));
        }
        if path.resolved.exists() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "error",
                "message": format!("Path '{}' exists and is not a directory.", path.relative_display()),
            }));
        }

        fs::create_dir_all(&path.resolved)
            .await
            .with_context(|| format!("Failed to create {}", path.resolved.display()))?;
        Ok(json!({
            "directory_path": input.directory_path,
            "status": "created",
            "message": format!("Directory '{}' created.", path.relative_display()),
        }))
    }

    fn name(&self) -> &str {
        tools::CREATE_DIRECTORY
    }

    fn description(&self) -> &str {
        "Creates a directory, including any missing parent directories."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Path of the directory to create, e.g. 'src/utils'."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["directory_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// Delete a single file
#[derive(Clone)]
pub struct DeleteFileTool {
    scope: WorkspaceScope,
}

impl DeleteFileTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: ReadFileInput = parse_input(self.name(), args)?;
        let path = self.scope.resolve(&input.file_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("file_path", &input.file_path));
        }

        let metadata = match fs::symlink_metadata(&path.resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(json!({
                    "file_path": input.file_path,
                    "status": "not_found",
                    "message": format!("File '{}' not found.", path.relative_display()),
                }));
            }
            Err(e) => return Err(e).context("Failed to inspect file"),
        };
        if metadata.is_dir() {
            return Ok(json!({
                "file_path": input.file_path,
                "status": "error",
                "message": format!("Path '{}' is not a file.", path.relative_display()),
            }));
        }

        fs::remove_file(&path.resolved)
            .await
            .with_context(|| format!("Failed to delete {}", path.resolved.display()))?;
        info!(path = %path.resolved.display(), "deleted file");
        Ok(json!({
            "file_path": input.file_path,
            "status": "success",
            "message": format!("File '{}' deleted successfully.", path.relative_display()),
        }))
    }

    fn name(&self) -> &str {
        tools::DELETE_FILE
    }

    fn description(&self) -> &str {
        "Deletes a single file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to delete."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["file_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// Delete a directory
#[derive(Clone)]
pub struct DeleteDirectoryTool {
    scope: WorkspaceScope,
}

impl DeleteDirectoryTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for DeleteDirectoryTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: DeleteDirectoryInput = parse_input(self.name(), args)?;
        let path = self
            .scope
            .resolve(&input.directory_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("directory_path", &input.directory_path));
        }
        if path.is_base() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "error",
                "message": "Cannot delete the base directory itself.",
            }));
        }
        if !path.resolved.exists() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "not_found",
                "message": format!("Directory '{}' not found.", path.relative_display()),
            }));
        }
        if !path.resolved.is_dir() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "error",
                "message": format!("Path '{}' is not a directory.", path.relative_display()),
            }));
        }

        let result = if input.recursive {
            fs::remove_dir_all(&path.resolved).await
        } else {
            fs::remove_dir(&path.resolved).await
        };
        if let Err(e) = result {
            debug!(error = %e, "directory removal failed");
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "error",
                "error": e.to_string(),
            }));
        }

        info!(path = %path.resolved.display(), "deleted directory");
        Ok(json!({
            "directory_path": input.directory_path,
            "status": "success",
            "message": format!(
                "Directory '{}' and its contents deleted successfully.",
                path.relative_display()
            ),
        }))
    }

    fn name(&self) -> &str {
        tools::DELETE_DIRECTORY
    }

    fn description(&self) -> &str {
        "Deletes a directory and, unless recursive is false, everything inside it. The base directory itself cannot be deleted."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Path of the directory to delete, e.g. 'old_folder'."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Delete contents too (default true). When false only an empty directory is removed."
                },
                "use_focus_path": use_focus_path_property()
            },
            "required": ["directory_path"]
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::FileOperations
    }
}

/// List the entries of one directory
#[derive(Clone)]
pub struct ListDirectoryTool {
    scope: WorkspaceScope,
}

impl ListDirectoryTool {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: ListDirectoryInput = parse_input(self.name(), args)?;
        let path = self
            .scope
            .resolve(&input.directory_path, input.use_focus_path);
        if !path.inside_base {
            return Ok(access_denied("directory_path", &input.directory_path));
        }
        if !path.resolved.exists() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "not_found",
                "message": format!("Directory '{}' not found.", path.relative_display()),
            }));
        }
        if !path.resolved.is_dir() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "error",
                "message": format!("Path '{}' is not a directory.", path.relative_display()),
            }));
        }

        let mut items = Vec::new();
        let mut entries = fs::read_dir(&path.resolved)
            .await
            .with_context(|| format!("Failed to list {}", path.resolved.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let kind = if file_type.is_dir() { "directory" } else { "file" };
            items.push((entry.file_name().to_string_lossy().into_owned(), kind));
        }
        items.sort_by(|a, b| a.0.cmp(&b.0));

        if items.is_empty() {
            return Ok(json!({
                "directory_path": input.directory_path,
                "status": "success",
                "entries": [],
                "message": "The directory is empty.",
            }));
        }

        let entries: Vec<Value> = items
            .into_iter()
            .map(|(name, kind)| json!({"name": name, "type": kind}))
            .collect();
        Ok(json!({
            "directory_path": input.directory_path,
            "status": "success",
            "count": entries.len(),
            "entries": entries,
        }))
    }

    fn name(&self) -> &str {
        tools::LIST_DIRECTORY_CONTENTS
    }

    fn description(&self) -> &str {
        "Lists the files and subdirectories directly inside a directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Directory to list (default '.')."
                },
                "use_focus_path": use_focus_path_property()
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

    fn scope(dir: &TempDir) -> WorkspaceScope {
        WorkspaceScope::new(dir.path().to_path_buf(), None)
    }

    #[tokio::test]
    async fn write_then_read_creates_parents() -> Result<()> {
        let dir = TempDir::new()?;
        let written = WriteFileTool::new(scope(&dir))
            .execute(json!({"file_path": "a/b/c.txt", "content": "hello"}))
            .await?;
        assert_eq!(written["status"], "success");

        let read = ReadFileTool::new(scope(&dir))
            .execute(json!({"file_path": "a/b/c.txt"}))
            .await?;
        assert_eq!(read["content"], "hello");
        Ok(())
    }

    #[tokio::test]
    async fn read_reports_missing_and_directories() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("sub"))?;
        let tool = ReadFileTool::new(scope(&dir));
        assert_eq!(
            tool.execute(json!({"file_path": "nope.txt"})).await?["status"],
            "not_found"
        );
        assert_eq!(
            tool.execute(json!({"file_path": "sub"})).await?["status"],
            "error"
        );
        let denied = tool.execute(json!({"file_path": "../x"})).await?;
        assert_eq!(denied["error"], crate::workspace::ACCESS_DENIED);
        Ok(())
    }

    #[tokio::test]
    async fn create_empty_file_respects_overwrite() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("f.txt"), "data")?;
        let tool = CreateEmptyFileTool::new(scope(&dir));

        let kept = tool.execute(json!({"file_path": "f.txt"})).await?;
        assert_eq!(kept["status"], "exists");
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt"))?, "data");

        let truncated = tool
            .execute(json!({"file_path": "f.txt", "overwrite": true}))
            .await?;
        assert_eq!(truncated["status"], "success");
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt"))?, "");
        Ok(())
    }

    #[tokio::test]
    async fn create_directory_reports_existing() -> Result<()> {
        let dir = TempDir::new()?;
        let tool = CreateDirectoryTool::new(scope(&dir));
        let first = tool.execute(json!({"directory_path": "x/y"})).await?;
        assert_eq!(first["status"], "created");
        let second = tool.execute(json!({"directory_path": "x/y"})).await?;
        assert_eq!(second["status"], "exists");
        Ok(())
    }

    #[tokio::test]
    async fn delete_directory_refuses_base() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("gone/inner"))?;
        let tool = DeleteDirectoryTool::new(scope(&dir));

        let base = tool.execute(json!({"directory_path": "."})).await?;
        assert_eq!(base["status"], "error");
        assert!(dir.path().exists());

        let missing = tool.execute(json!({"directory_path": "nope"})).await?;
        assert_eq!(missing["status"], "not_found");

        let removed = tool.execute(json!({"directory_path": "gone"})).await?;
        assert_eq!(removed["status"], "success");
        assert!(!dir.path().join("gone").exists());
        Ok(())
    }

    #[tokio::test]
    async fn delete_file_rejects_directories() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("d"))?;
        std::fs::write(dir.path().join("f"), "x")?;
        let tool = DeleteFileTool::new(scope(&dir));
        assert_eq!(
            tool.execute(json!({"file_path": "d"})).await?["status"],
            "error"
        );
        assert_eq!(
            tool.execute(json!({"file_path": "f"})).await?["status"],
            "success"
        );
        assert_eq!(
            tool.execute(json!({"file_path": "f"})).await?["status"],
            "not_found"
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_directory_sorts_and_handles_empty() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("empty"))?;
        std::fs::write(dir.path().join("b.txt"), "")?;
        let tool = ListDirectoryTool::new(scope(&dir));

        let listing = tool.execute(json!({})).await?;
        assert_eq!(listing["entries"][0]["name"], "b.txt");
        assert_eq!(listing["entries"][0]["type"], "file");
        assert_eq!(listing["entries"][1]["name"], "empty");
        assert_eq!(listing["entries"][1]["type"], "directory");

        let empty = tool.execute(json!({"directory_path": "empty"})).await?;
        assert_eq!(empty["message"], "The directory is empty.");
        Ok(())
    }
}
