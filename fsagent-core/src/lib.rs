//! # fsagent-core
//!
//! Library behind the `fsagent` command-line assistant: an OpenRouter
//! chat-completions client, a registry of local file, formatting and git
//! tools, and the turn loop that feeds tool results back to the model until
//! it answers.
//!
//! ```rust,no_run
//! use fsagent_core::core::agent::{AgentRunner, NoopEvents, RunnerSettings};
//! use fsagent_core::llm::OpenRouterProvider;
//! use fsagent_core::prompts::system_prompt;
//! use fsagent_core::tools::ToolRegistry;
//! use fsagent_core::workspace::WorkspaceScope;
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let scope = WorkspaceScope::from_current_dir(None)?;
//! let api_key = std::env::var("OPENROUTER_API_KEY")?;
//! let provider = OpenRouterProvider::from_config(api_key, None, None, Duration::from_secs(90))?;
//! let registry = ToolRegistry::new(scope);
//! let mut runner = AgentRunner::new(
//!     provider,
//!     registry,
//!     system_prompt(None),
//!     RunnerSettings::new("google/gemini-2.5-flash-preview"),
//! );
//! let outcome = runner.run_turn("List the files here", &mut NoopEvents).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversation;
pub mod core;
pub mod llm;
pub mod prompts;
pub mod tools;
pub mod ui;
pub mod utils;
pub mod workspace;

pub use config::{AgentConfig, ConfigManager};
pub use conversation::ConversationStore;
pub use self::core::agent::{AgentRunner, RunnerSettings, TurnEvents, TurnOutcome};
pub use llm::{LLMProvider, Message, OpenRouterProvider};
pub use tools::ToolRegistry;
pub use workspace::WorkspaceScope;
