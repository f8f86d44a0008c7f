use crate::tools::traits::{Tool, ToolCategory};
use std::sync::Arc;

/// A named tool with its category and handler
#[derive(Clone)]
pub struct ToolRegistration {
    name: String,
    category: ToolCategory,
    handler: Arc<dyn Tool>,
}

impl ToolRegistration {
    pub fn from_tool(tool: Arc<dyn Tool>) -> Self {
        Self {
            name: tool.name().to_string(),
            category: tool.category(),
            handler: tool,
        }
    }

    pub fn from_tool_instance<T>(tool: T) -> Self
    where
        T: Tool + 'static,
    {
        Self::from_tool(Arc::new(tool))
    }

    /// Override the category reported by the tool
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ToolCategory {
        self.category
    }

    pub fn handler(&self) -> Arc<dyn Tool> {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}
