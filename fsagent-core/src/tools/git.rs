//! Git tools backed by the `git` command line

use super::traits::{Tool, ToolCategory};
use super::types::{
    CheckoutInput, CreateBranchInput, GitCloneInput, GitCommitInput, GitLogInput, GitPullInput,
    GitPushInput, parse_input,
};
use crate::config::constants::tools;
use crate::workspace::{WorkspaceScope, access_denied};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const LOCAL_TIMEOUT: Duration = Duration::from_secs(30);
const NETWORK_TIMEOUT: Duration = Duration::from_secs(300);
const PRETTY_FORMATS: &[&str] = &["oneline", "short", "medium", "full", "fuller"];

/// The git operations exposed as tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOperation {
    Status,
    Log,
    Commit,
    ListBranches,
    CreateBranch,
    Checkout,
    Push,
    Pull,
    Clone,
}

impl GitOperation {
    pub const ALL: [GitOperation; 9] = [
        GitOperation::Status,
        GitOperation::Log,
        GitOperation::Commit,
        GitOperation::ListBranches,
        GitOperation::CreateBranch,
        GitOperation::Checkout,
        GitOperation::Push,
        GitOperation::Pull,
        GitOperation::Clone,
    ];

    fn timeout(self) -> Duration {
        match self {
            Self::Push | Self::Pull | Self::Clone => NETWORK_TIMEOUT,
            _ => LOCAL_TIMEOUT,
        }
    }
}

/// Output of a finished git process
struct GitOutput {
    success: bool,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn failure(&self, command: &str) -> Value {
        json!({
            "status": "error",
            "command": command,
            "exit_code": self.exit_code,
            "stderr": self.stderr.trim(),
            "stdout": self.stdout.trim(),
        })
    }
}

/// One git subcommand exposed to the model
#[derive(Clone)]
pub struct GitTool {
    operation: GitOperation,
    scope: WorkspaceScope,
}

impl GitTool {
    pub fn new(operation: GitOperation, scope: WorkspaceScope) -> Self {
        Self { operation, scope }
    }

    /// One tool per supported operation
    pub fn all(scope: &WorkspaceScope) -> Vec<GitTool> {
        GitOperation::ALL
            .into_iter()
            .map(|operation| GitTool::new(operation, scope.clone()))
            .collect()
    }

    async fn run(&self, args: &[String]) -> Result<GitOutput> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.args(args)
            .current_dir(self.scope.base_dir())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        debug!(args = ?args, "running git");

        let timeout = self.operation.timeout();
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("git {} timed out after {} seconds", args.join(" "), timeout.as_secs()))?
            .map_err(|e| anyhow!("Failed to execute git: {e}"))?;

        Ok(GitOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run git, mapping a non-zero exit into an error payload
    async fn run_checked(&self, args: Vec<String>) -> Result<std::result::Result<String, Value>> {
        let output = self.run(&args).await?;
        if output.success {
            Ok(Ok(output.stdout))
        } else {
            info!(exit_code = ?output.exit_code, "git {} failed", args.join(" "));
            Ok(Err(output.failure(&format!("git {}", args.join(" ")))))
        }
    }

    async fn execute_operation(&self, args: Value) -> Result<Value> {
        match self.operation {
            GitOperation::Status => {
                let stdout = match self
                    .run_checked(strings(&["status", "--porcelain=v1", "--branch"]))
                    .await?
                {
                    Ok(stdout) => stdout,
                    Err(failure) => return Ok(failure),
                };
                let status = parse_porcelain(&stdout);
                Ok(json!({
                    "status": "success",
                    "branch": status.branch,
                    "staged": status.staged,
                    "unstaged": status.unstaged,
                    "untracked": status.untracked,
                    "clean": status.is_clean(),
                }))
            }
            GitOperation::Log => {
                let input: GitLogInput = parse_input(self.name(), args)?;
                if !PRETTY_FORMATS.contains(&input.pretty.as_str()) {
                    return Ok(json!({
                        "status": "error",
                        "message": format!(
                            "Unsupported pretty format '{}'. Use one of: {}.",
                            input.pretty,
                            PRETTY_FORMATS.join(", ")
                        ),
                    }));
                }
                let args = vec![
                    "log".to_string(),
                    "--no-color".to_string(),
                    format!("--max-count={}", input.max_count.max(1)),
                    format!("--pretty={}", input.pretty),
                ];
                Ok(success_with_output(self.run_checked(args).await?))
            }
            GitOperation::Commit => {
                let input: GitCommitInput = parse_input(self.name(), args)?;
                if input.message.trim().is_empty() {
                    return Ok(json!({
                        "status": "error",
                        "message": "A commit message is required.",
                    }));
                }
                let mut args = strings(&["commit"]);
                if input.all_changes {
                    args.push("--all".to_string());
                }
                args.push("--message".to_string());
                args.push(input.message);
                Ok(success_with_output(self.run_checked(args).await?))
            }
            GitOperation::ListBranches => {
                let stdout = match self
                    .run_checked(strings(&["branch", "--list", "--no-color"]))
                    .await?
                {
                    Ok(stdout) => stdout,
                    Err(failure) => return Ok(failure),
                };
                let (branches, current) = parse_branches(&stdout);
                Ok(json!({
                    "status": "success",
                    "branches": branches,
                    "current": current,
                }))
            }
            GitOperation::CreateBranch => {
                let input: CreateBranchInput = parse_input(self.name(), args)?;
                if let Some(rejected) = reject_option_like("branch_name", &input.branch_name) {
                    return Ok(rejected);
                }
                let result = self
                    .run_checked(vec!["branch".to_string(), input.branch_name.clone()])
                    .await?;
                Ok(with_field(success_with_output(result), "branch", input.branch_name))
            }
            GitOperation::Checkout => {
                let input: CheckoutInput = parse_input(self.name(), args)?;
                if let Some(rejected) = reject_option_like("branch_or_path", &input.branch_or_path)
                {
                    return Ok(rejected);
                }
                let mut args = strings(&["checkout"]);
                if input.force {
                    args.push("--force".to_string());
                }
                if input.create_new_branch {
                    args.push("-b".to_string());
                }
                args.push(input.branch_or_path);
                Ok(success_with_combined_output(self.run(&args).await?, &args))
            }
            GitOperation::Push => {
                let input: GitPushInput = parse_input(self.name(), args)?;
                if let Some(rejected) = reject_remote_and_branch(&input.remote, input.branch.as_deref()) {
                    return Ok(rejected);
                }
                let mut args = strings(&["push"]);
                if input.force {
                    args.push("--force".to_string());
                }
                if input.set_upstream {
                    args.push("--set-upstream".to_string());
                }
                args.push(input.remote);
                args.extend(input.branch);
                Ok(success_with_combined_output(self.run(&args).await?, &args))
            }
            GitOperation::Pull => {
                let input: GitPullInput = parse_input(self.name(), args)?;
                if let Some(rejected) = reject_remote_and_branch(&input.remote, input.branch.as_deref()) {
                    return Ok(rejected);
                }
                let mut args = vec!["pull".to_string(), input.remote];
                args.extend(input.branch);
                Ok(success_with_combined_output(self.run(&args).await?, &args))
            }
            GitOperation::Clone => {
                let input: GitCloneInput = parse_input(self.name(), args)?;
                if let Some(rejected) = reject_option_like("repo_url", &input.repo_url) {
                    return Ok(rejected);
                }
                let dest = input
                    .dest_dir
                    .clone()
                    .unwrap_or_else(|| repo_name_from_url(&input.repo_url));
                let resolved = self.scope.resolve(&dest, true);
                if !resolved.inside_base || resolved.is_base() {
                    return Ok(access_denied("dest_dir", &dest));
                }
                if resolved.resolved.exists() {
                    return Ok(json!({
                        "status": "error",
                        "dest_dir": dest,
                        "message": format!("Destination '{}' already exists.", resolved.relative_display()),
                    }));
                }
                let dest_path: PathBuf = resolved.resolved.clone();
                let args = vec![
                    "clone".to_string(),
                    input.repo_url.clone(),
                    dest_path.display().to_string(),
                ];
                let result = self.run(&args).await?;
                Ok(with_field(
                    success_with_combined_output(result, &args),
                    "dest_dir",
                    resolved.relative_display(),
                ))
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn success_with_output(result: std::result::Result<String, Value>) -> Value {
    match result {
        Ok(stdout) => json!({"status": "success", "output": stdout.trim_end()}),
        Err(failure) => failure,
    }
}

// checkout, push, pull and clone report progress on stderr even on success
fn success_with_combined_output(output: GitOutput, args: &[String]) -> Value {
    if !output.success {
        return output.failure(&format!("git {}", args.join(" ")));
    }
    let combined = [output.stdout.trim(), output.stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    json!({"status": "success", "output": combined})
}

fn with_field(mut value: Value, key: &str, field: String) -> Value {
    if value["status"] == "success" {
        value[key] = json!(field);
    }
    value
}

fn reject_option_like(field: &str, value: &str) -> Option<Value> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        Some(json!({
            "status": "error",
            "message": format!("Invalid {field}: '{value}'."),
        }))
    } else {
        None
    }
}

fn reject_remote_and_branch(remote: &str, branch: Option<&str>) -> Option<Value> {
    reject_option_like("remote", remote)
        .or_else(|| branch.and_then(|branch| reject_option_like("branch", branch)))
}

fn repo_name_from_url(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Parsed `git status --porcelain=v1 --branch`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PorcelainStatus {
    pub branch: Option<String>,
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
}

impl PorcelainStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

pub fn parse_porcelain(output: &str) -> PorcelainStatus {
    let mut status = PorcelainStatus::default();
    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            let branch = header
                .strip_prefix("No commits yet on ")
                .unwrap_or(header)
                .split("...")
                .next()
                .unwrap_or(header)
                .trim();
            status.branch = Some(branch.to_string());
            continue;
        }
        if line.len() < 4 {
            continue;
        }
        let (codes, path) = line.split_at(3);
        let mut chars = codes.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');
        if index == '?' && worktree == '?' {
            status.untracked.push(path.to_string());
            continue;
        }
        if index != ' ' {
            status.staged.push(path.to_string());
        }
        if worktree != ' ' {
            status.unstaged.push(path.to_string());
        }
    }
    status
}

fn parse_branches(output: &str) -> (Vec<String>, Option<String>) {
    let mut current = None;
    let branches = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let name = line[2.min(line.len())..].trim().to_string();
            if line.starts_with('*') {
                current = Some(name.clone());
            }
            name
        })
        .collect();
    (branches, current)
}

#[async_trait]
impl Tool for GitTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        self.execute_operation(args).await
    }

    fn name(&self) -> &str {
        match self.operation {
            GitOperation::Status => tools::GIT_STATUS,
            GitOperation::Log => tools::GIT_LOG,
            GitOperation::Commit => tools::GIT_COMMIT,
            GitOperation::ListBranches => tools::LIST_BRANCHES,
            GitOperation::CreateBranch => tools::CREATE_BRANCH,
            GitOperation::Checkout => tools::CHECKOUT,
            GitOperation::Push => tools::GIT_PUSH,
            GitOperation::Pull => tools::GIT_PULL,
            GitOperation::Clone => tools::GIT_CLONE,
        }
    }

    fn description(&self) -> &str {
        match self.operation {
            GitOperation::Status => {
                "Shows the git working tree status: current branch plus staged, unstaged and untracked files."
            }
            GitOperation::Log => "Shows recent commits.",
            GitOperation::Commit => {
                "Records staged changes in a new commit. Set all_changes to also stage modified tracked files. Confirm the message with the user first."
            }
            GitOperation::ListBranches => "Lists local branches and marks the current one.",
            GitOperation::CreateBranch => "Creates a new branch without switching to it.",
            GitOperation::Checkout => {
                "Switches branches or restores a path. Set create_new_branch to create the branch first."
            }
            GitOperation::Push => "Pushes commits to a remote. Confirm with the user before pushing.",
            GitOperation::Pull => "Fetches from a remote and integrates the changes.",
            GitOperation::Clone => {
                "Clones a repository into a directory inside the base directory (default: the repository name)."
            }
        }
    }

    fn parameters(&self) -> Value {
        let properties = match self.operation {
            GitOperation::Status | GitOperation::ListBranches => json!({}),
            GitOperation::Log => json!({
                "max_count": {"type": "integer", "description": "Number of commits to show (default 10)."},
                "pretty": {
                    "type": "string",
                    "enum": PRETTY_FORMATS,
                    "description": "Output format (default oneline)."
                }
            }),
            GitOperation::Commit => json!({
                "message": {"type": "string", "description": "Commit message."},
                "all_changes": {"type": "boolean", "description": "Stage all modified tracked files first (default false)."}
            }),
            GitOperation::CreateBranch => json!({
                "branch_name": {"type": "string", "description": "Name of the new branch."}
            }),
            GitOperation::Checkout => json!({
                "branch_or_path": {"type": "string", "description": "Branch, commit or path to check out."},
                "force": {"type": "boolean", "description": "Discard local changes (default false)."},
                "create_new_branch": {"type": "boolean", "description": "Create the branch before switching (default false)."}
            }),
            GitOperation::Push => json!({
                "remote": {"type": "string", "description": "Remote name (default origin)."},
                "branch": {"type": "string", "description": "Branch to push (default: current)."},
                "force": {"type": "boolean", "description": "Force push (default false)."},
                "set_upstream": {"type": "boolean", "description": "Set the upstream branch (default false)."}
            }),
            GitOperation::Pull => json!({
                "remote": {"type": "string", "description": "Remote name (default origin)."},
                "branch": {"type": "string", "description": "Branch to pull (default: tracking branch)."}
            }),
            GitOperation::Clone => json!({
                "repo_url": {"type": "string", "description": "URL of the repository to clone."},
                "dest_dir": {"type": "string", "description": "Target directory inside the base directory."}
            }),
        };
        let required: &[&str] = match self.operation {
            GitOperation::Commit => &["message"],
            GitOperation::CreateBranch => &["branch_name"],
            GitOperation::Checkout => &["branch_or_path"],
            GitOperation::Clone => &["repo_url"],
            _ => &[],
        };
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Git
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn parses_porcelain_output() {
        let output = "## main...origin/main [ahead 1]\nM  staged.rs\n M changed.rs\nMM both.rs\n?? new.txt\n";
        let status = parse_porcelain(output);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.staged, vec!["staged.rs", "both.rs"]);
        assert_eq!(status.unstaged, vec!["changed.rs", "both.rs"]);
        assert_eq!(status.untracked, vec!["new.txt"]);
        assert!(!status.is_clean());

        let fresh = parse_porcelain("## No commits yet on trunk\n");
        assert_eq!(fresh.branch.as_deref(), Some("trunk"));
        assert!(fresh.is_clean());
    }

    #[test]
    fn parses_branch_list() {
        let (branches, current) = parse_branches("  feature\n* main\n");
        assert_eq!(branches, vec!["feature", "main"]);
        assert_eq!(current.as_deref(), Some("main"));
    }

    #[test]
    fn derives_clone_directory_from_url() {
        assert_eq!(repo_name_from_url("https://github.com/a/b.git"), "b");
        assert_eq!(repo_name_from_url("git@github.com:a/tool"), "tool");
        assert_eq!(repo_name_from_url("https://host/repo/"), "repo");
    }

    #[test]
    fn every_operation_has_a_distinct_schema() {
        let scope = WorkspaceScope::new(std::env::temp_dir(), None);
        let tools = GitTool::all(&scope);
        let mut names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), GitOperation::ALL.len());
        for tool in &tools {
            assert_eq!(tool.parameters()["type"], "object");
            assert_eq!(tool.category(), ToolCategory::Git);
        }
    }

    #[tokio::test]
    async fn rejects_option_like_arguments() -> Result<()> {
        let dir = TempDir::new()?;
        let scope = WorkspaceScope::new(dir.path().to_path_buf(), None);
        let branch = GitTool::new(GitOperation::CreateBranch, scope.clone());
        let result = branch.execute(json!({"branch_name": "--delete"})).await?;
        assert_eq!(result["status"], "error");

        let log = GitTool::new(GitOperation::Log, scope);
        let result = log.execute(json!({"pretty": "format:%H"})).await?;
        assert_eq!(result["status"], "error");
        Ok(())
    }

    #[tokio::test]
    async fn status_in_fresh_repository() -> Result<()> {
        if !git_available() {
            return Ok(());
        }
        let dir = TempDir::new()?;
        let scope = WorkspaceScope::new(dir.path().to_path_buf(), None);
        let outside = GitTool::new(GitOperation::Status, scope.clone())
            .execute(json!({}))
            .await?;
        // Temp dirs are normally outside any repository.
        if outside["status"] == "error" {
            assert!(outside["exit_code"].is_number());
        }

        std::process::Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status()?;
        std::fs::write(dir.path().join("new.txt"), "x")?;

        let status = GitTool::new(GitOperation::Status, scope)
            .execute(json!({}))
            .await?;
        assert_eq!(status["status"], "success");
        assert_eq!(status["untracked"], json!(["new.txt"]));
        assert_eq!(status["clean"], false);
        Ok(())
    }
}
