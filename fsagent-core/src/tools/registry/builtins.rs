use super::{RegistryOptions, ToolRegistration, ToolRegistry};
use crate::conversation::ConversationStore;
use crate::tools::conversation::DumpMessagesTool;
use crate::tools::diff::ProposedDiffTool;
use crate::tools::file_ops::{
    CreateDirectoryTool, CreateEmptyFileTool, DeleteDirectoryTool, DeleteFileTool,
    ListDirectoryTool, ReadFileTool, WriteFileTool,
};
use crate::tools::formatting::{RichOutputTool, SyntaxHighlightTool};
use crate::tools::git::GitTool;
use crate::tools::move_files::MoveFilesTool;
use crate::tools::search::SearchFilesTool;
use tracing::warn;

pub(super) fn register_builtin_tools(registry: &mut ToolRegistry, options: &RegistryOptions) {
    let scope = registry.scope.clone();
    let mut builtins = vec![
        ToolRegistration::from_tool_instance(ReadFileTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(WriteFileTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(CreateEmptyFileTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(CreateDirectoryTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(DeleteFileTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(DeleteDirectoryTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(ListDirectoryTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(SearchFilesTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(MoveFilesTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(ProposedDiffTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(SyntaxHighlightTool::new(scope.clone())),
        ToolRegistration::from_tool_instance(RichOutputTool::new()),
    ];

    if options.enable_git {
        builtins.extend(
            GitTool::all(&scope)
                .into_iter()
                .map(ToolRegistration::from_tool_instance),
        );
    }

    builtins.push(ToolRegistration::from_tool_instance(DumpMessagesTool::new(
        ConversationStore::new(scope),
        registry.history.clone(),
        options.model.clone(),
    )));

    for registration in builtins {
        let name = registration.name().to_string();
        if let Err(err) = registry.register_tool(registration) {
            warn!(tool = %name, %err, "failed to register tool");
        }
    }
}
