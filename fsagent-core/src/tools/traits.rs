//! Core trait for the tool system

use crate::llm::provider::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Grouping used for the tool table and help output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolCategory {
    FileOperations,
    Formatting,
    Git,
    Conversation,
    Miscellaneous,
    Custom,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 6] = [
        ToolCategory::FileOperations,
        ToolCategory::Formatting,
        ToolCategory::Git,
        ToolCategory::Conversation,
        ToolCategory::Miscellaneous,
        ToolCategory::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ToolCategory::FileOperations => "File Operations",
            ToolCategory::Formatting => "Formatting",
            ToolCategory::Git => "Git",
            ToolCategory::Conversation => "Conversation",
            ToolCategory::Miscellaneous => "Miscellaneous",
            ToolCategory::Custom => "Custom",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A callable exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with JSON arguments, returning a JSON result
    async fn execute(&self, args: Value) -> Result<Value>;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the accepted arguments
    fn parameters(&self) -> Value;

    fn category(&self) -> ToolCategory {
        ToolCategory::Miscellaneous
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.name().to_string(),
            self.description().to_string(),
            self.parameters(),
        )
    }
}
