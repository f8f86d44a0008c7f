//! Tool registry: name lookup, schemas and dispatch

mod builtins;
mod error;
mod registration;

pub use error::ToolRegistryError;
pub use registration::ToolRegistration;

use builtins::register_builtin_tools;

use super::manifest::discover_manifests;
use super::traits::ToolCategory;
use crate::config::constants::models;
use crate::conversation::HistorySnapshot;
use crate::llm::provider::{Message, ToolDefinition};
use crate::workspace::WorkspaceScope;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Settings that decide which built-ins are registered
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub enable_git: bool,
    /// Model recorded in conversations saved by `dump_messages`
    pub model: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            enable_git: true,
            model: models::openrouter::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Row of the tool table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    pub name: String,
    pub category: ToolCategory,
    pub description: String,
}

#[derive(Clone)]
pub struct ToolRegistry {
    scope: WorkspaceScope,
    history: HistorySnapshot,
    tool_registrations: Vec<ToolRegistration>,
    tool_lookup: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self::with_options(scope, RegistryOptions::default())
    }

    pub fn with_options(scope: WorkspaceScope, options: RegistryOptions) -> Self {
        let mut registry = Self {
            scope,
            history: HistorySnapshot::new(),
            tool_registrations: Vec::new(),
            tool_lookup: HashMap::new(),
        };
        register_builtin_tools(&mut registry, &options);
        debug!(count = registry.len(), "registered built-in tools");
        registry
    }

    /// Registry with no tools, for callers that register everything themselves
    pub fn empty(scope: WorkspaceScope) -> Self {
        Self {
            scope,
            history: HistorySnapshot::new(),
            tool_registrations: Vec::new(),
            tool_lookup: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, registration: ToolRegistration) -> Result<(), ToolRegistryError> {
        if self.tool_lookup.contains_key(registration.name()) {
            return Err(ToolRegistryError::Duplicate(registration.name().to_string()));
        }

        let index = self.tool_registrations.len();
        self.tool_lookup
            .insert(registration.name().to_string(), index);
        self.tool_registrations.push(registration);
        Ok(())
    }

    /// Register tool manifests found under `dir`. Returns how many were added.
    pub fn discover(&mut self, dir: &Path) -> usize {
        let working_dir = self.scope.base_dir().to_path_buf();
        let mut added = 0;
        for tool in discover_manifests(dir, &working_dir) {
            let source = tool.source().display().to_string();
            match self.register_tool(ToolRegistration::from_tool_instance(tool)) {
                Ok(()) => added += 1,
                Err(err) => warn!(%source, %err, "skipping tool manifest"),
            }
        }
        if added > 0 {
            info!(count = added, dir = %dir.display(), "registered custom tools");
        }
        added
    }

    /// Schemas sent to the model, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registrations
            .iter()
            .map(|registration| registration.handler().definition())
            .collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tool_lookup.contains_key(name)
    }

    pub fn available_tools(&self) -> Vec<String> {
        self.tool_registrations
            .iter()
            .map(|registration| registration.name().to_string())
            .collect()
    }

    pub fn entries(&self) -> Vec<ToolEntry> {
        self.tool_registrations
            .iter()
            .map(|registration| ToolEntry {
                name: registration.name().to_string(),
                category: registration.category(),
                description: registration.handler().description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tool_registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tool_registrations.is_empty()
    }

    pub fn scope(&self) -> &WorkspaceScope {
        &self.scope
    }

    /// Refresh the history view used by conversation tools
    pub fn sync_history(&self, messages: &[Message]) {
        self.history.replace(messages);
    }

    pub async fn execute_tool(&self, name: &str, args: Value) -> Result<Value> {
        let registration = self
            .tool_lookup
            .get(name)
            .and_then(|index| self.tool_registrations.get(*index))
            .ok_or_else(|| ToolRegistryError::NotFound(name.to_string()))?;

        debug!(tool = name, "executing tool");
        registration.handler().execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::tools;
    use crate::tools::traits::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        async fn execute(&self, _args: Value) -> Result<Value> {
            Ok(json!({"status": "success", "reply": "pong"}))
        }

        fn name(&self) -> &str {
            "ping"
        }

        fn description(&self) -> &str {
            "Replies with pong"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
    }

    fn registry(dir: &TempDir) -> ToolRegistry {
        ToolRegistry::new(WorkspaceScope::new(dir.path().to_path_buf(), None))
    }

    #[test]
    fn registers_all_builtins_in_order() -> Result<()> {
        let dir = TempDir::new()?;
        let registry = registry(&dir);
        let names = registry.available_tools();
        assert_eq!(names.len(), 22);
        assert_eq!(names[0], tools::READ_FILE_CONTENT);
        assert_eq!(names.last().map(String::as_str), Some(tools::DUMP_MESSAGES));
        let definitions = registry.definitions();
        assert_eq!(definitions.len(), names.len());
        assert_eq!(definitions[0].function_name(), tools::READ_FILE_CONTENT);
        Ok(())
    }

    #[test]
    fn git_tools_are_optional() -> Result<()> {
        let dir = TempDir::new()?;
        let registry = ToolRegistry::with_options(
            WorkspaceScope::new(dir.path().to_path_buf(), None),
            RegistryOptions {
                enable_git: false,
                ..RegistryOptions::default()
            },
        );
        assert!(!registry.has_tool(tools::GIT_STATUS));
        assert!(registry.has_tool(tools::MOVE_FILES));
        assert!(
            registry
                .entries()
                .iter()
                .all(|entry| entry.category != ToolCategory::Git)
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let mut registry = ToolRegistry::empty(WorkspaceScope::new(dir.path().to_path_buf(), None));
        registry.register_tool(ToolRegistration::from_tool_instance(PingTool))?;
        let err = registry
            .register_tool(ToolRegistration::from_tool_instance(PingTool))
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Tool 'ping' is already registered"));

        let result = registry.execute_tool("ping", json!({})).await?;
        assert_eq!(result["reply"], "pong");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() -> Result<()> {
        let dir = TempDir::new()?;
        let registry = registry(&dir);
        let err = match registry.execute_tool("nope", json!({})).await {
            Ok(_) => None,
            Err(err) => err.downcast::<ToolRegistryError>().ok(),
        };
        assert!(matches!(err, Some(ToolRegistryError::NotFound(name)) if name == "nope"));
        Ok(())
    }

    #[test]
    fn discovered_manifests_cannot_shadow_builtins() -> Result<()> {
        let dir = TempDir::new()?;
        let tools_dir = dir.path().join("tools");
        std::fs::create_dir(&tools_dir)?;
        std::fs::write(
            tools_dir.join("shadow.toml"),
            "name = \"read_file_content\"\ndescription = \"x\"\ncommand = [\"cat\"]\n",
        )?;
        std::fs::write(
            tools_dir.join("extra.toml"),
            "name = \"extra\"\ndescription = \"x\"\ncommand = [\"cat\"]\n",
        )?;

        let mut registry = registry(&dir);
        let before = registry.len();
        assert_eq!(registry.discover(&tools_dir), 1);
        assert_eq!(registry.len(), before + 1);
        assert!(registry.has_tool("extra"));
        Ok(())
    }
}
