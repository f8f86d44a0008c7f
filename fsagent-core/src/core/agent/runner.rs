use super::events::TurnEvents;
use crate::config::constants::defaults;
use crate::conversation::request_window;
use crate::llm::provider::{LLMProvider, LLMRequest, Message, MessageRole, ToolCall};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

/// Result of one user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Final text answer from the model
    Answer(String),
    /// The model finished without any text
    Empty,
    /// The model kept requesting tools past the configured limit
    ToolLimit { rounds: usize },
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub model: String,
    pub max_history_items: usize,
    pub max_tool_rounds: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl RunnerSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_history_items: defaults::MAX_HISTORY_ITEMS,
            max_tool_rounds: defaults::MAX_TOOL_ROUNDS,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Owns the history and runs turns against a provider and a tool registry
pub struct AgentRunner<P: LLMProvider> {
    provider: P,
    registry: ToolRegistry,
    settings: RunnerSettings,
    system_prompt: String,
    messages: Vec<Message>,
}

fn error_payload(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

impl<P: LLMProvider> AgentRunner<P> {
    pub fn new(
        provider: P,
        registry: ToolRegistry,
        system_prompt: String,
        settings: RunnerSettings,
    ) -> Self {
        let messages = vec![Message::system(system_prompt.clone())];
        registry.sync_history(&messages);
        Self {
            provider,
            registry,
            settings,
            system_prompt,
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Keep only the system message
    pub fn clear(&mut self) {
        self.messages.truncate(1);
        if self
            .messages
            .first()
            .is_none_or(|message| message.role != MessageRole::System)
        {
            self.messages = vec![Message::system(self.system_prompt.clone())];
        }
        self.registry.sync_history(&self.messages);
    }

    /// Replace the history, adding the current system prompt when the new
    /// history does not start with one
    pub fn replace_history(&mut self, messages: Vec<Message>) {
        let starts_with_system = messages
            .first()
            .is_some_and(|message| message.role == MessageRole::System);
        self.messages = if starts_with_system {
            messages
        } else {
            let mut with_prompt = Vec::with_capacity(messages.len() + 1);
            with_prompt.push(Message::system(self.system_prompt.clone()));
            with_prompt.extend(messages);
            with_prompt
        };
        self.registry.sync_history(&self.messages);
    }

    /// Build a request from the most recent part of the history. The stored
    /// history stays complete for saving.
    fn request(&self) -> LLMRequest {
        let window = request_window(&self.messages, self.settings.max_history_items);
        let mut request = LLMRequest::new(self.settings.model.clone(), window)
            .with_tools(self.registry.definitions());
        request.max_tokens = self.settings.max_tokens;
        request.temperature = self.settings.temperature;
        request
    }

    async fn call_model(&self, events: &mut dyn TurnEvents) -> Result<Message> {
        let request = self.request();
        debug!(
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending model request"
        );
        events.on_request_start();
        let response = self.provider.generate(request).await;
        events.on_request_end();

        let response =
            response.with_context(|| format!("{} request failed", self.provider.name()))?;
        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "model usage"
            );
        }
        Ok(response.into_message())
    }

    /// Execute one call and build the tool message content
    async fn dispatch(&self, call: &ToolCall, events: &mut dyn TurnEvents) -> Value {
        let name = call.function.name.as_str();
        events.on_tool_call(name, &call.function.arguments);

        let result = if !self.registry.has_tool(name) {
            warn!(tool = name, "model requested an unknown tool");
            error_payload(format!(
                "Function '{name}' not found by the client application."
            ))
        } else {
            match call.parsed_arguments() {
                Err(e) => {
                    warn!(tool = name, error = %e, "invalid tool arguments");
                    error_payload("Invalid arguments format received from LLM.")
                }
                Ok(args) => match self.registry.execute_tool(name, args).await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(tool = name, error = %format!("{e:#}"), "tool execution failed");
                        json!({ "error": format!("{e:#}"), "status": "error" })
                    }
                },
            }
        };

        events.on_tool_result(name, &result);
        result
    }

    /// Run one user turn through to a final answer
    pub async fn run_turn(
        &mut self,
        input: &str,
        events: &mut dyn TurnEvents,
    ) -> Result<TurnOutcome> {
        self.messages.push(Message::user(input.to_string()));
        self.registry.sync_history(&self.messages);

        let reply = match self.call_model(events).await {
            Ok(reply) => reply,
            Err(err) => {
                // The failed input is not part of the conversation.
                if self
                    .messages
                    .last()
                    .is_some_and(|message| message.role == MessageRole::User)
                {
                    self.messages.pop();
                }
                self.registry.sync_history(&self.messages);
                return Err(err);
            }
        };
        self.messages.push(reply);

        let mut rounds = 0;
        loop {
            let calls: Vec<ToolCall> = match self.messages.last() {
                Some(message) if message.has_tool_calls() => {
                    message.get_tool_calls().unwrap_or_default().to_vec()
                }
                Some(message) => {
                    let text = message.content.trim();
                    self.registry.sync_history(&self.messages);
                    return Ok(if text.is_empty() {
                        TurnOutcome::Empty
                    } else {
                        TurnOutcome::Answer(text.to_string())
                    });
                }
                None => return Ok(TurnOutcome::Empty),
            };

            if let Some(note) = self
                .messages
                .last()
                .map(|message| message.content.trim())
                .filter(|text| !text.is_empty())
            {
                events.on_assistant_note(note);
            }

            if rounds >= self.settings.max_tool_rounds {
                warn!(rounds, "tool round limit reached");
                // Every call needs a response for the history to stay valid.
                for call in &calls {
                    let content = error_payload("Tool call limit reached for this turn.");
                    self.messages.push(Message::tool_response(
                        call.id.clone(),
                        call.function.name.clone(),
                        content.to_string(),
                    ));
                }
                self.registry.sync_history(&self.messages);
                return Ok(TurnOutcome::ToolLimit { rounds });
            }
            rounds += 1;

            info!(round = rounds, calls = calls.len(), "executing tool calls");
            self.registry.sync_history(&self.messages);
            for call in &calls {
                let result = self.dispatch(call, events).await;
                let content = serde_json::to_string(&result)?;
                self.messages.push(Message::tool_response(
                    call.id.clone(),
                    call.function.name.clone(),
                    content,
                ));
            }

            // A failed follow-up keeps the tool results already in the history.
            let reply = self.call_model(events).await?;
            self.messages.push(reply);
        }
    }
}
