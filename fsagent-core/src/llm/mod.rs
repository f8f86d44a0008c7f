//! # LLM Integration Layer
//!
//! Provider-neutral request/response types live in [`provider`]; concrete
//! HTTP clients live in [`providers`]. The turn runner only depends on the
//! [`LLMProvider`] trait, so tests can drive it with a scripted provider.

pub mod provider;
pub mod providers;

pub use provider::{
    FinishReason, FunctionCall, FunctionDefinition, LLMError, LLMProvider, LLMRequest,
    LLMResponse, Message, MessageRole, ToolCall, ToolChoice, ToolDefinition, Usage,
};
pub use providers::OpenRouterProvider;
