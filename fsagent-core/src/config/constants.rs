/// Model ID constants
pub mod models {
    pub mod openrouter {
        pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-preview";
        pub const SUPPORTED_MODELS: &[&str] = &[
            "google/gemini-2.5-flash-preview",
            "google/gemini-2.5-pro",
            "anthropic/claude-sonnet-4",
            "openai/gpt-5",
            "qwen/qwen3-coder",
            "deepseek/deepseek-chat-v3.1",
        ];
    }
}

/// Endpoint constants
pub mod urls {
    pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
}

/// Environment variable names
pub mod env_vars {
    pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
    pub const MODEL_OVERRIDE: &str = "FSAGENT_MODEL";
}

/// Message role constants to avoid hardcoding strings
pub mod message_roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const TOOL: &str = "tool";
}

/// Default values used when the config file leaves a field unset
pub mod defaults {
    pub const MAX_HISTORY_ITEMS: usize = 10;
    pub const MAX_TOOL_ROUNDS: usize = 25;
    pub const REQUEST_TIMEOUT_SECS: u64 = 90;
    pub const HISTORY_FILE: &str = ".agent_history";
    pub const CUSTOM_TOOLS_DIR: &str = ".fsagent/tools";
}

/// File and directory names the agent owns
pub mod paths {
    pub const CONFIG_FILE: &str = "fsagent.toml";
    pub const HOME_CONFIG_DIR: &str = ".fsagent";
    pub const CONVERSATIONS_DIR: &str = "conversations";
    pub const GITIGNORE_FILE: &str = ".gitignore";
}

/// Tool name constants to avoid hardcoding strings throughout the codebase
pub mod tools {
    pub const READ_FILE_CONTENT: &str = "read_file_content";
    pub const WRITE_TO_FILE: &str = "write_to_file";
    pub const CREATE_EMPTY_FILE: &str = "create_empty_file";
    pub const CREATE_DIRECTORY: &str = "create_directory";
    pub const DELETE_FILE: &str = "delete_file";
    pub const DELETE_DIRECTORY: &str = "delete_directory";
    pub const LIST_DIRECTORY_CONTENTS: &str = "list_directory_contents";
    pub const SEARCH_FILES: &str = "search_files";
    pub const MOVE_FILES: &str = "move_files";
    pub const GET_DIFF_FOR_PROPOSED_CHANGES: &str = "get_diff_for_proposed_changes";
    pub const SYNTAX_HIGHLIGHT: &str = "syntax_highlight";
    pub const RICH_OUTPUT: &str = "rich_output";
    pub const GIT_STATUS: &str = "git_status";
    pub const GIT_LOG: &str = "git_log";
    pub const GIT_COMMIT: &str = "git_commit";
    pub const LIST_BRANCHES: &str = "list_branches";
    pub const CREATE_BRANCH: &str = "create_branch";
    pub const CHECKOUT: &str = "checkout";
    pub const GIT_PUSH: &str = "git_push";
    pub const GIT_PULL: &str = "git_pull";
    pub const GIT_CLONE: &str = "git_clone";
    pub const DUMP_MESSAGES: &str = "dump_messages";
}
