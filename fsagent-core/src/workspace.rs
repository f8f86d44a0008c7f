//! Base-directory scoping for tool paths.
//!
//! Every tool resolves user supplied paths against a base directory: the
//! focus path when one was given on the command line, otherwise the working
//! directory. Paths that escape the base are refused.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

pub const ACCESS_DENIED: &str = "Access denied: File path is outside the allowed directory.";

#[derive(Debug, Clone)]
pub struct WorkspaceScope {
    cwd: PathBuf,
    focus: Option<PathBuf>,
}

/// Result of resolving a user supplied path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub resolved: PathBuf,
    pub base_dir: PathBuf,
    pub inside_base: bool,
}

impl ResolvedPath {
    /// Path relative to the base directory, for messages shown to the model
    pub fn relative_display(&self) -> String {
        pathdiff::diff_paths(&self.resolved, &self.base_dir)
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| rel.display().to_string())
            .unwrap_or_else(|| ".".to_string())
    }

    pub fn is_base(&self) -> bool {
        self.resolved == self.base_dir
    }
}

impl WorkspaceScope {
    pub fn new(cwd: PathBuf, focus: Option<PathBuf>) -> Self {
        let cwd = canonical_or_normalized(&cwd);
        let focus = focus.map(|path| {
            let absolute = if path.is_absolute() {
                path
            } else {
                cwd.join(path)
            };
            canonical_or_normalized(&absolute)
        });
        Self { cwd, focus }
    }

    /// Scope rooted at the process working directory. A focus path that is
    /// not an existing directory is ignored with a warning.
    pub fn from_current_dir(focus: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let mut scope = Self::new(cwd, focus);
        if let Some(focus) = scope.focus.take_if(|focus| !focus.is_dir()) {
            warn!(
                path = %focus.display(),
                "focus path does not exist or is not a directory; continuing without it"
            );
        }
        Ok(scope)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn focus(&self) -> Option<&Path> {
        self.focus.as_deref()
    }

    /// Focus path when set, otherwise the working directory
    pub fn base_dir(&self) -> &Path {
        self.focus.as_deref().unwrap_or(&self.cwd)
    }

    pub fn base_for(&self, use_focus_path: bool) -> &Path {
        if use_focus_path {
            self.base_dir()
        } else {
            &self.cwd
        }
    }

    pub fn resolve(&self, path: &str, use_focus_path: bool) -> ResolvedPath {
        let base_dir = self.base_for(use_focus_path).to_path_buf();
        let trimmed = path.trim();
        let candidate = Path::new(if trimmed.is_empty() { "." } else { trimmed });
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            base_dir.join(candidate)
        };
        let resolved = normalize_path(&joined);

        // Symlinks can point outside the base even when the lexical path does not.
        let inside_base = resolved.starts_with(&base_dir)
            && real_location(&resolved).is_some_and(|real| real.starts_with(&base_dir));

        ResolvedPath {
            resolved,
            base_dir,
            inside_base,
        }
    }
}

/// Where `path` lands once symlinks are followed: the deepest entry that
/// exists is canonicalized and the missing components are appended. A dangling
/// symlink has no real location.
fn real_location(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut missing: Vec<OsString> = Vec::new();
    while existing.symlink_metadata().is_err() {
        missing.push(existing.file_name()?.to_os_string());
        existing = existing.parent()?;
    }
    let real = existing.canonicalize().ok()?;
    Some(missing.iter().rev().fold(real, |acc, part| acc.join(part)))
}

fn canonical_or_normalized(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| normalize_path(path))
}

/// Lexically remove `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Error payload for a path outside the base directory
pub fn access_denied(field: &str, value: &str) -> Value {
    let mut payload = json!({
        "error": ACCESS_DENIED,
        "status": "error",
    });
    payload[field] = Value::String(value.to_string());
    payload
}
