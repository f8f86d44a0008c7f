use crate::config::constants::{defaults, env_vars, models, paths, urls};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Model and turn-loop settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentSettings {
    /// OpenRouter model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Number of non-system messages sent with each request
    #[serde(default = "default_max_history_items")]
    pub max_history_items: usize,

    /// Upper bound on model round-trips caused by tool calls in one turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// HTTP timeout for a single completion request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Completion length cap passed to the model
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature; the provider default applies when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Replaces the built-in system prompt when set
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    models::openrouter::DEFAULT_MODEL.to_string()
}
fn default_api_base() -> String {
    urls::OPENROUTER_API_BASE.to_string()
}
fn default_api_key_env() -> String {
    env_vars::OPENROUTER_API_KEY.to_string()
}
fn default_max_history_items() -> usize {
    defaults::MAX_HISTORY_ITEMS
}
fn default_max_tool_rounds() -> usize {
    defaults::MAX_TOOL_ROUNDS
}
fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}
fn default_custom_tools_dir() -> String {
    defaults::CUSTOM_TOOLS_DIR.to_string()
}
fn default_history_file() -> String {
    defaults::HISTORY_FILE.to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            max_history_items: default_max_history_items(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens: None,
            temperature: None,
            system_prompt: None,
        }
    }
}

/// Tool registry settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsSettings {
    /// Directory scanned for tool manifests, relative to the base directory
    #[serde(default = "default_custom_tools_dir")]
    pub custom_tools_dir: String,

    /// Register the git tools
    #[serde(default = "default_true")]
    pub enable_git: bool,
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            custom_tools_dir: default_custom_tools_dir(),
            enable_git: true,
        }
    }
}

/// Terminal settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiSettings {
    /// Prompt history file, relative to the base directory
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Render answers containing code fences as markdown
    #[serde(default = "default_true")]
    pub render_markdown: bool,

    /// Print the tool table at startup
    #[serde(default = "default_true")]
    pub show_tool_table: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            render_markdown: true,
            show_tool_table: true,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub tools: ToolsSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

/// Configuration manager for locating and loading `fsagent.toml`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AgentConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration for a workspace.
    ///
    /// An explicit path must exist. Otherwise `<workspace>/fsagent.toml` is
    /// tried, then `~/.fsagent/fsagent.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>, workspace: &Path) -> Result<Self> {
        let mut manager = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_workspace(workspace)?,
        };
        manager.apply_env_overrides();
        manager.clamp_limits();
        Ok(manager)
    }

    /// The newest message is always sent, so the history window is at least one
    fn clamp_limits(&mut self) {
        let agent = &mut self.config.agent;
        if agent.max_history_items == 0 {
            warn!("max_history_items = 0 would drop the user's message; using 1");
            agent.max_history_items = 1;
        }
    }

    fn load_from_workspace(workspace: &Path) -> Result<Self> {
        let config_path = workspace.join(paths::CONFIG_FILE);
        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config_path = home_dir
                .join(paths::HOME_CONFIG_DIR)
                .join(paths::CONFIG_FILE);
            if home_config_path.exists() {
                return Self::load_from_file(&home_config_path);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self {
            config: AgentConfig::default(),
            config_path: None,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AgentConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config file");
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var(env_vars::MODEL_OVERRIDE) {
            let model = model.trim();
            if !model.is_empty() {
                self.config.agent.model = model.to_string();
            }
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AgentConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AgentConfig {
        self.config
    }

    /// Get the configuration file path (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_yields_defaults() -> Result<()> {
        let config: AgentConfig = toml::from_str("")?;
        assert_eq!(config.agent.model, models::openrouter::DEFAULT_MODEL);
        assert_eq!(config.agent.max_history_items, defaults::MAX_HISTORY_ITEMS);
        assert_eq!(config.ui.history_file, ".agent_history");
        assert!(config.tools.enable_git);
        Ok(())
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() -> Result<()> {
        let config: AgentConfig = toml::from_str(
            r#"
[agent]
model = "openai/gpt-5"
max_tool_rounds = 3

[ui]
render_markdown = false
"#,
        )?;
        assert_eq!(config.agent.model, "openai/gpt-5");
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.agent.request_timeout_secs, 90);
        assert!(!config.ui.render_markdown);
        assert!(config.ui.show_tool_table);
        Ok(())
    }

    #[test]
    fn workspace_config_is_preferred() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(paths::CONFIG_FILE),
            "[agent]\nmax_history_items = 4\n",
        )?;
        let manager = ConfigManager::load_from_workspace(dir.path())?;
        assert_eq!(manager.config().agent.max_history_items, 4);
        assert!(manager.config_path().is_some());
        Ok(())
    }

    #[test]
    fn zero_history_window_is_raised_to_one() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[agent]\nmax_history_items = 0\nmax_tokens = 512\ntemperature = 0.2\n",
        )?;
        let manager = ConfigManager::load(Some(&path), dir.path())?;
        let agent = &manager.config().agent;
        assert_eq!(agent.max_history_items, 1);
        assert_eq!(agent.max_tokens, Some(512));
        assert_eq!(agent.temperature, Some(0.2));
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = match tempdir() {
            Ok(dir) => dir,
            Err(err) => panic!("tempdir: {err}"),
        };
        let missing = dir.path().join("nope.toml");
        assert!(ConfigManager::load(Some(&missing), dir.path()).is_err());
    }
}
