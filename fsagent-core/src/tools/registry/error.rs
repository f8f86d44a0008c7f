use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolRegistryError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Tool '{0}' is already registered")]
    Duplicate(String),
}
