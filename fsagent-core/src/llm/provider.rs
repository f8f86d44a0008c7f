//! Provider-neutral chat types.
//!
//! Messages use the OpenAI chat-completions shape on the wire and on disk:
//!
//! - **Roles**: `system`, `user`, `assistant`, `tool`
//! - **Tool calls**: only `assistant` messages carry `tool_calls`
//! - **Tool results**: `tool` messages reference the originating call through
//!   `tool_call_id` and repeat the function `name`
//!
//! ```rust
//! use fsagent_core::llm::provider::{Message, MessageRole};
//!
//! let reply = Message::tool_response(
//!     "call_123".to_string(),
//!     "read_file_content".to_string(),
//!     r#"{"status":"success"}"#.to_string(),
//! );
//! assert_eq!(reply.role, MessageRole::Tool);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Universal LLM request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub tool_choice: Option<ToolChoice>,
}

impl LLMRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: None,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            tool_choice: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        if !tools.is_empty() {
            self.tools = Some(tools);
            self.tool_choice = Some(ToolChoice::auto());
        }
        self
    }
}

/// Tool choice sent alongside the tool definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to call tools
    Auto,
}

impl ToolChoice {
    pub fn auto() -> Self {
        Self::Auto
    }

    /// Value placed in the `tool_choice` request field
    pub fn to_wire_format(&self) -> Value {
        match self {
            Self::Auto => json!("auto"),
        }
    }
}

/// Universal message structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,

    /// Assistant messages that only carry tool calls arrive with `null` content
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Function name on tool responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    fn with_role(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: String) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn assistant(content: String) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Create an assistant message with tool calls
    pub fn assistant_with_tools(content: String, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role(MessageRole::Assistant, content)
        }
    }

    pub fn system(content: String) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// Create a tool response message
    /// ```json
    /// {
    ///   "role": "tool",
    ///   "tool_call_id": "call_123",
    ///   "name": "read_file_content",
    ///   "content": "{\"status\":\"success\"}"
    /// }
    /// ```
    pub fn tool_response(tool_call_id: String, name: String, content: String) -> Self {
        Self {
            tool_call_id: Some(tool_call_id),
            name: Some(name),
            ..Self::with_role(MessageRole::Tool, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .is_some_and(|calls| !calls.is_empty())
    }

    pub fn get_tool_calls(&self) -> Option<&[ToolCall]> {
        self.tool_calls.as_deref()
    }

    /// Check the OpenAI constraints on role-specific fields
    pub fn validate(&self) -> Result<(), String> {
        if let Some(tool_calls) = &self.tool_calls {
            if !self.role.can_make_tool_calls() {
                return Err(format!("Role {:?} cannot make tool calls", self.role));
            }
            for tool_call in tool_calls {
                tool_call.validate()?;
            }
        }

        if self.role == MessageRole::Tool && self.tool_call_id.is_none() {
            return Err("tool messages must have tool_call_id".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_openai_str(&self) -> &'static str {
        use crate::config::constants::message_roles;
        match self {
            MessageRole::System => message_roles::SYSTEM,
            MessageRole::User => message_roles::USER,
            MessageRole::Assistant => message_roles::ASSISTANT,
            MessageRole::Tool => message_roles::TOOL,
        }
    }

    /// Only assistant messages can initiate tool calls
    pub fn can_make_tool_calls(&self) -> bool {
        matches!(self, MessageRole::Assistant)
    }
}

/// Tool schema advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Always "function"
    #[serde(rename = "type")]
    pub tool_type: String,

    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,

    pub description: String,

    /// JSON Schema object describing the arguments
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: String, description: String, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name,
                description,
                parameters,
            },
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function.name
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call (e.g., "call_123")
    pub id: String,

    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,

    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// Raw JSON text exactly as the model produced it
    pub arguments: String,
}

impl ToolCall {
    pub fn function(id: String, name: String, arguments: String) -> Self {
        Self {
            id,
            call_type: function_type(),
            function: FunctionCall { name, arguments },
        }
    }

    /// Parse the arguments as JSON. Empty argument text is treated as `{}`.
    pub fn parsed_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.function.arguments.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.function.arguments)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Tool call ID cannot be empty".to_string());
        }

        if self.function.name.is_empty() {
            return Err("Function name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Universal LLM response
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<Usage>,
    pub finish_reason: FinishReason,
}

impl LLMResponse {
    /// Convert into the assistant message appended to history
    pub fn into_message(self) -> Message {
        let content = self.content.unwrap_or_default();
        match self.tool_calls {
            Some(calls) if !calls.is_empty() => Message::assistant_with_tools(content, calls),
            _ => Message::assistant(content),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error(String),
}

/// Chat-completion backend
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name (e.g., "openrouter")
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    fn validate_request(&self, request: &LLMRequest) -> Result<(), LLMError> {
        if request.messages.is_empty() {
            return Err(LLMError::InvalidRequest(
                "Messages cannot be empty".to_string(),
            ));
        }
        for message in &request.messages {
            message.validate().map_err(LLMError::InvalidRequest)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Provider error: {0}")]
    Provider(String),
}
