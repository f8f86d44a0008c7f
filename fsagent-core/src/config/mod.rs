//! Configuration for fsagent.
//!
//! Settings are read from `fsagent.toml`; every field has a default so an
//! empty or missing file yields a working configuration. API keys are never
//! stored in the file, only the name of the environment variable to read.

pub mod api_keys;
pub mod constants;
pub mod loader;

pub use api_keys::{ConfigError, load_dotenv, resolve_api_key};
pub use loader::{AgentConfig, AgentSettings, ConfigManager, ToolsSettings, UiSettings};
