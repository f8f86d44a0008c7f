//! Tools declared by TOML manifests and run as external commands.
//!
//! A manifest looks like:
//!
//! ```toml
//! name = "word_count"
//! description = "Counts words in the given text"
//! command = ["wc", "-w"]
//!
//! [parameters]
//! type = "object"
//! required = ["text"]
//!
//! [parameters.properties.text]
//! type = "string"
//! ```
//!
//! The JSON arguments are written to the command's stdin. Stdout is returned
//! as JSON when it parses, otherwise as text under `output`.

use super::traits::{Tool, ToolCategory};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use walkdir::WalkDir;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    name: String,
    description: String,
    command: Vec<String>,
    #[serde(default)]
    parameters: Option<toml::Value>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ManifestTool {
    name: String,
    description: String,
    parameters: Value,
    command: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
    source: PathBuf,
}

pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl ManifestTool {
    /// Parse a manifest; relative commands run in `working_dir`
    pub fn from_toml(source: &Path, text: &str, working_dir: &Path) -> Result<Self> {
        let manifest: ManifestFile = toml::from_str(text).context("invalid manifest TOML")?;
        if !is_valid_tool_name(&manifest.name) {
            bail!(
                "tool name '{}' must be 1-{MAX_NAME_LEN} characters of letters, digits, '_' or '-'",
                manifest.name
            );
        }
        if manifest.command.first().is_none_or(|program| program.trim().is_empty()) {
            bail!("command must name a program");
        }

        let parameters = match manifest.parameters {
            Some(parameters) => {
                serde_json::to_value(parameters).context("parameters are not valid JSON schema")?
            }
            None => json!({"type": "object", "properties": {}}),
        };
        if !parameters.is_object() {
            bail!("parameters must be a table");
        }

        Ok(Self {
            name: manifest.name,
            description: manifest.description,
            parameters,
            command: manifest.command,
            working_dir: working_dir.to_path_buf(),
            timeout: Duration::from_secs(manifest.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            source: source.to_path_buf(),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Collect every valid manifest under `dir`. Invalid manifests are logged and
/// skipped.
pub fn discover_manifests(dir: &Path, working_dir: &Path) -> Vec<ManifestTool> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no custom tool directory");
        return Vec::new();
    }

    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|ext| ext.to_str()) == Some("toml")
        })
        .filter_map(|entry| {
            let path = entry.path();
            let loaded = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .and_then(|text| ManifestTool::from_toml(path, &text, working_dir));
            match loaded {
                Ok(tool) => Some(tool),
                Err(e) => {
                    warn!(path = %path.display(), error = %format!("{e:#}"), "skipping tool manifest");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl Tool for ManifestTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let (program, rest) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("tool '{}' has an empty command", self.name))?;

        let mut child = tokio::process::Command::new(program)
            .args(rest)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start '{program}' for tool '{}'", self.name))?;

        let payload = serde_json::to_vec(&args)?;
        let stdin = child.stdin.take();
        let name = self.name.as_str();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A command that ignores stdin may close it early.
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!(tool = %name, error = %e, "stdin closed before arguments were written");
                }
            }
        };
        let run = async {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                anyhow!(
                    "Tool '{}' timed out after {} seconds",
                    self.name,
                    self.timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to wait for tool '{}'", self.name))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Ok(json!({
                "status": "error",
                "exit_code": output.status.code(),
                "stderr": stderr.trim(),
            }));
        }

        match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(value) if value.is_object() => Ok(value),
            _ => Ok(json!({
                "status": "success",
                "output": stdout.trim_end(),
            })),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Custom
    }
}
