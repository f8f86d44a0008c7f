use crate::config::constants::{models, urls};
use crate::llm::provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, MessageRole, ToolCall, Usage,
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "OpenRouter";

fn provider_error(message: impl AsRef<str>) -> String {
    format!("{PROVIDER}: {}", message.as_ref())
}

fn parse_usage_value(value: &Value) -> Usage {
    let field = |name: &str| value.get(name).and_then(Value::as_u64).unwrap_or(0) as u32;
    Usage {
        prompt_tokens: field("prompt_tokens"),
        completion_tokens: field("completion_tokens"),
        total_tokens: field("total_tokens"),
    }
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        other => FinishReason::Error(other.to_string()),
    }
}

/// Client for the OpenRouter chat-completions endpoint
pub struct OpenRouterProvider {
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn from_config(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::Network(provider_error(format!("client setup: {e}"))))?;

        Ok(Self {
            api_key,
            http_client,
            base_url: base_url
                .unwrap_or_else(|| urls::OPENROUTER_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| models::openrouter::DEFAULT_MODEL.to_string()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn convert_to_openrouter_format(&self, request: &LLMRequest) -> Result<Value, LLMError> {
        let mut messages = Vec::with_capacity(request.messages.len());

        for msg in &request.messages {
            let mut message = json!({
                "role": msg.role.as_openai_str(),
                "content": msg.content
            });

            if msg.role == MessageRole::Assistant && msg.has_tool_calls() {
                let tool_calls_json: Vec<Value> = msg
                    .get_tool_calls()
                    .unwrap_or_default()
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.function.name,
                                "arguments": tc.function.arguments
                            }
                        })
                    })
                    .collect();
                message["tool_calls"] = Value::Array(tool_calls_json);
                if msg.content.is_empty() {
                    message["content"] = Value::Null;
                }
            }

            if msg.role == MessageRole::Tool {
                if let Some(tool_call_id) = &msg.tool_call_id {
                    message["tool_call_id"] = Value::String(tool_call_id.clone());
                }
                if let Some(name) = &msg.name {
                    message["name"] = Value::String(name.clone());
                }
            }

            messages.push(message);
        }

        if messages.is_empty() {
            return Err(LLMError::InvalidRequest(provider_error(
                "No messages provided",
            )));
        }

        let mut provider_request = json!({
            "model": if request.model.trim().is_empty() {
                &self.model
            } else {
                &request.model
            },
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            provider_request["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = request.temperature {
            provider_request["temperature"] = json!(temperature);
        }

        if let Some(tools) = &request.tools {
            if !tools.is_empty() {
                provider_request["tools"] = serde_json::to_value(tools).map_err(|e| {
                    LLMError::InvalidRequest(provider_error(format!("tool schema: {e}")))
                })?;
                if let Some(tool_choice) = &request.tool_choice {
                    provider_request["tool_choice"] = tool_choice.to_wire_format();
                }
            }
        }

        Ok(provider_request)
    }

    fn parse_openrouter_response(&self, response_json: Value) -> Result<LLMResponse, LLMError> {
        if let Some(error) = response_json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(LLMError::Provider(provider_error(message)));
        }

        let choices = response_json
            .get("choices")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                LLMError::Provider(provider_error("Invalid response format: missing choices"))
            })?;

        let choice = choices
            .first()
            .ok_or_else(|| LLMError::Provider(provider_error("No choices in response")))?;

        let message = choice.get("message").ok_or_else(|| {
            LLMError::Provider(provider_error("Invalid response format: missing message"))
        })?;

        let content = match message.get("content") {
            Some(Value::String(text)) => Some(text.to_string()),
            Some(Value::Array(parts)) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("");
                if text.is_empty() { None } else { Some(text) }
            }
            _ => None,
        };

        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .enumerate()
                    .filter_map(|(index, call)| {
                        let function = call.get("function")?;
                        let name = function
                            .get("name")
                            .and_then(Value::as_str)
                            .filter(|name| !name.is_empty())?;
                        let id = call
                            .get("id")
                            .and_then(Value::as_str)
                            .filter(|id| !id.trim().is_empty())
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("tool_call_{index}"));
                        let serialized = match function.get("arguments") {
                            Some(Value::String(text)) => text.clone(),
                            Some(Value::Null) | None => "{}".to_string(),
                            Some(other) => other.to_string(),
                        };
                        Some(ToolCall::function(id, name.to_string(), serialized))
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|calls| !calls.is_empty());

        let finish_reason = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(map_finish_reason)
            .unwrap_or(FinishReason::Stop);

        let usage = response_json.get("usage").map(parse_usage_value);

        Ok(LLMResponse {
            content,
            tool_calls,
            usage,
            finish_reason,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.validate_request(&request)?;
        let provider_request = self.convert_to_openrouter_format(&request)?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %provider_request["model"],
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&provider_request)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("Request timed out: {e}")
                } else {
                    format!("Network error: {e}")
                };
                LLMError::Network(provider_error(message))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, "chat completion request failed");

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    LLMError::Authentication(provider_error(format!("HTTP {status}: {error_text}")))
                }
                StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
                _ => LLMError::Provider(provider_error(format!("HTTP {status}: {error_text}"))),
            });
        }

        let openrouter_response: Value = response.json().await.map_err(|e| {
            LLMError::Provider(provider_error(format!("Failed to parse response: {e}")))
        })?;

        let parsed = self.parse_openrouter_response(openrouter_response)?;
        if let Some(usage) = parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{Message, ToolChoice, ToolDefinition};

    fn provider() -> OpenRouterProvider {
        match OpenRouterProvider::from_config(
            "sk-test".to_string(),
            Some("test/model".to_string()),
            Some("http://localhost:1/api/".to_string()),
            Duration::from_secs(1),
        ) {
            Ok(provider) => provider,
            Err(err) => panic!("provider setup failed: {err}"),
        }
    }

    #[test]
    fn request_body_carries_tools_and_history() -> anyhow::Result<()> {
        let provider = provider();
        assert_eq!(provider.base_url(), "http://localhost:1/api");

        let call = ToolCall::function(
            "call_1".into(),
            "read_file_content".into(),
            r#"{"file_path":"a.txt"}"#.into(),
        );
        let request = LLMRequest::new(
            "",
            vec![
                Message::system("sys".into()),
                Message::user("read a.txt".into()),
                Message::assistant_with_tools(String::new(), vec![call]),
                Message::tool_response("call_1".into(), "read_file_content".into(), "{}".into()),
            ],
        )
        .with_tools(vec![ToolDefinition::function(
            "read_file_content".into(),
            "Reads a file".into(),
            json!({"type": "object", "properties": {}}),
        )]);

        let body = provider.convert_to_openrouter_format(&request)?;
        assert_eq!(body["model"], "test/model");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "read_file_content");
        let messages = body["messages"].as_array().map(Vec::len);
        assert_eq!(messages, Some(4));
        assert!(body["messages"][2]["content"].is_null());
        assert_eq!(body["messages"][2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
        assert_eq!(body["messages"][3]["name"], "read_file_content");
        Ok(())
    }

    #[test]
    fn tool_choice_is_omitted_without_tools() -> anyhow::Result<()> {
        let mut request = LLMRequest::new("x/y", vec![Message::user("hi".into())]);
        request.tool_choice = Some(ToolChoice::auto());
        let body = provider().convert_to_openrouter_format(&request)?;
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["model"], "x/y");
        Ok(())
    }

    #[test]
    fn parses_text_and_tool_calls() -> anyhow::Result<()> {
        let response = provider().parse_openrouter_response(json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "git_status", "arguments": "{}"}},
                        {"type": "function", "function": {"name": "git_log", "arguments": {"max_count": 2}}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))?;

        assert!(response.content.is_none());
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        let calls = response.tool_calls.unwrap_or_default();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].id, "tool_call_1");
        assert_eq!(calls[1].function.arguments, r#"{"max_count":2}"#);
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(15));
        Ok(())
    }

    #[test]
    fn blank_call_ids_are_replaced_and_nameless_calls_dropped() -> anyhow::Result<()> {
        let response = provider().parse_openrouter_response(json!({
            "choices": [{
                "message": {
                    "content": "",
                    "tool_calls": [
                        {"id": "", "function": {"name": "list_branches", "arguments": ""}},
                        {"id": "b", "function": {"name": "", "arguments": "{}"}},
                        {"id": "  ", "function": {"name": "git_status"}}
                    ]
                }
            }]
        }))?;
        let calls = response.tool_calls.unwrap_or_default();
        let ids: Vec<&str> = calls.iter().map(|call| call.id.as_str()).collect();
        assert_eq!(ids, vec!["tool_call_0", "tool_call_2"]);
        assert!(calls.iter().all(|call| call.validate().is_ok()));
        Ok(())
    }

    #[test]
    fn missing_choices_or_message_is_a_provider_error() {
        let provider = provider();
        assert!(matches!(
            provider.parse_openrouter_response(json!({"id": "x"})),
            Err(LLMError::Provider(_))
        ));
        assert!(matches!(
            provider.parse_openrouter_response(json!({"choices": []})),
            Err(LLMError::Provider(_))
        ));
        assert!(matches!(
            provider.parse_openrouter_response(json!({"choices": [{"index": 0}]})),
            Err(LLMError::Provider(_))
        ));
        let err = provider
            .parse_openrouter_response(json!({"error": {"message": "bad key"}}))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("bad key"));
    }
}
