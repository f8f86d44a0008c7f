//! Tools the model can call, and the registry that dispatches them

pub mod conversation;
pub mod diff;
pub mod file_ops;
pub mod formatting;
pub mod git;
pub mod manifest;
pub mod move_files;
pub mod registry;
pub mod search;
pub mod traits;
pub mod types;

pub use registry::{RegistryOptions, ToolEntry, ToolRegistration, ToolRegistry, ToolRegistryError};
pub use traits::{Tool, ToolCategory};
