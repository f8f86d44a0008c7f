//! Argument structures for the built-in tools

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_dot() -> String {
    ".".to_string()
}

fn default_star() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadFileInput {
    pub file_path: String,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileInput {
    pub file_path: String,
    pub content: String,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmptyFileInput {
    pub file_path: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryInput {
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteDirectoryInput {
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDirectoryInput {
    #[serde(default = "default_dot")]
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchFilesInput {
    #[serde(default = "default_dot")]
    pub search_path: String,
    #[serde(default = "default_star")]
    pub file_pattern: String,
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveFilesInput {
    pub source_path: String,
    pub destination_path: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposedDiffInput {
    pub file_path: String,
    pub proposed_new_content: String,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyntaxHighlightInput {
    pub file_path: String,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RichFormat {
    #[default]
    Markdown,
    Code,
    Syntax,
    Panel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichOutputInput {
    pub content: String,
    #[serde(default)]
    pub format_type: RichFormat,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLogInput {
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    #[serde(default = "default_pretty")]
    pub pretty: String,
}

fn default_max_count() -> u32 {
    10
}

fn default_pretty() -> String {
    "oneline".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitCommitInput {
    pub message: String,
    #[serde(default)]
    pub all_changes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBranchInput {
    pub branch_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub branch_or_path: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub create_new_branch: bool,
}

fn default_remote() -> String {
    "origin".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitPushInput {
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub set_upstream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitPullInput {
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitCloneInput {
    pub repo_url: String,
    #[serde(default)]
    pub dest_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DumpMessagesInput {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_true")]
    pub use_focus_path: bool,
}

/// Deserialize tool arguments, naming the tool in the error
pub fn parse_input<T: serde::de::DeserializeOwned>(
    tool: &str,
    args: serde_json::Value,
) -> anyhow::Result<T> {
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("Invalid '{tool}' arguments: {e}"))
}
