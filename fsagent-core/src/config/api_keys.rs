//! API key loading.

use std::env;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API key found. Set the {env_var} environment variable (or add it to a .env file)")]
    MissingApiKey { env_var: String },
}

/// Load environment variables from a `.env` file in the current directory.
///
/// A missing file is not an error; a malformed one is logged and ignored.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment from .env"),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to load .env file: {e}"),
    }
}

/// Read the API key from the named environment variable.
pub fn resolve_api_key(env_var: &str) -> Result<String, ConfigError> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingApiKey {
            env_var: env_var.to_string(),
        }),
    }
}
