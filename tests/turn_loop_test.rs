use anyhow::Result;
use async_trait::async_trait;
use fsagent_core::conversation::ConversationStore;
use fsagent_core::core::agent::{AgentRunner, NoopEvents, RunnerSettings, TurnEvents, TurnOutcome};
use fsagent_core::llm::{LLMError, LLMProvider, LLMRequest, LLMResponse, MessageRole, ToolCall};
use fsagent_core::tools::ToolRegistry;
use fsagent_core::workspace::WorkspaceScope;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replays canned responses and records every request
#[derive(Clone, Default)]
struct MockProvider {
    replies: Arc<Mutex<VecDeque<Result<LLMResponse, LLMError>>>>,
    requests: Arc<Mutex<Vec<LLMRequest>>>,
}

impl MockProvider {
    fn new(replies: Vec<Result<LLMResponse, LLMError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| Err(LLMError::Provider("no scripted reply".to_string())))
    }
}

fn answer(text: &str) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse {
        content: Some(text.to_string()),
        ..LLMResponse::default()
    })
}

fn tool_calls(calls: &[(&str, &str, &str)]) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse {
        tool_calls: Some(
            calls
                .iter()
                .map(|(id, name, args)| {
                    ToolCall::function(id.to_string(), name.to_string(), args.to_string())
                })
                .collect(),
        ),
        ..LLMResponse::default()
    })
}

fn runner(dir: &TempDir, provider: MockProvider) -> AgentRunner<MockProvider> {
    let registry = ToolRegistry::new(WorkspaceScope::new(dir.path().to_path_buf(), None));
    AgentRunner::new(
        provider,
        registry,
        "You manage files.".to_string(),
        RunnerSettings::new("mock-model"),
    )
}

#[derive(Default)]
struct EventLog {
    entries: Vec<String>,
}

impl TurnEvents for EventLog {
    fn on_request_start(&mut self) {
        self.entries.push("request".to_string());
    }

    fn on_tool_call(&mut self, name: &str, _arguments: &str) {
        self.entries.push(format!("call:{name}"));
    }

    fn on_tool_result(&mut self, name: &str, result: &Value) {
        let status = result["status"].as_str().unwrap_or("none");
        self.entries.push(format!("result:{name}:{status}"));
    }
}

#[tokio::test]
async fn model_writes_file_through_tool_call() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = MockProvider::new(vec![
        tool_calls(&[(
            "call_1",
            "write_to_file",
            r#"{"file_path":"notes/todo.md","content":"- ship it\n"}"#,
        )]),
        answer("Created notes/todo.md."),
    ]);
    let mut runner = runner(&dir, provider.clone());
    let mut log = EventLog::default();

    let outcome = runner.run_turn("Create a todo file", &mut log).await?;
    assert_eq!(outcome, TurnOutcome::Answer("Created notes/todo.md.".into()));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes/todo.md"))?,
        "- ship it\n"
    );
    assert_eq!(
        log.entries,
        vec![
            "request",
            "call:write_to_file",
            "result:write_to_file:success",
            "request"
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let follow_up = &requests[1].messages;
    let tool_message = follow_up
        .iter()
        .find(|message| message.role == MessageRole::Tool)
        .map(|message| (message.tool_call_id.clone(), message.name.clone()));
    assert_eq!(
        tool_message,
        Some((Some("call_1".to_string()), Some("write_to_file".to_string())))
    );
    Ok(())
}

#[tokio::test]
async fn tool_failures_are_reported_to_the_model() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = MockProvider::new(vec![
        tool_calls(&[
            ("a", "summon_dragon", "{}"),
            ("b", "read_file_content", "not json"),
            ("c", "read_file_content", r#"{"wrong_field":1}"#),
        ]),
        answer("Sorry, those failed."),
    ]);
    let mut runner = runner(&dir, provider.clone());
    runner.run_turn("do things", &mut NoopEvents).await?;

    let contents: Vec<Value> = runner
        .messages()
        .iter()
        .filter(|message| message.role == MessageRole::Tool)
        .map(|message| serde_json::from_str(&message.content))
        .collect::<Result<_, _>>()?;
    assert_eq!(contents.len(), 3);
    assert_eq!(
        contents[0]["error"],
        "Function 'summon_dragon' not found by the client application."
    );
    assert_eq!(
        contents[1]["error"],
        "Invalid arguments format received from LLM."
    );
    assert_eq!(contents[2]["status"], "error");
    assert!(
        contents[2]["error"]
            .as_str()
            .is_some_and(|error| error.contains("read_file_content"))
    );
    Ok(())
}

#[tokio::test]
async fn api_failure_leaves_history_unchanged() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = MockProvider::new(vec![
        Err(LLMError::Authentication("bad key".to_string())),
        answer("second try works"),
    ]);
    let mut runner = runner(&dir, provider);

    let err = runner.run_turn("hello", &mut NoopEvents).await;
    assert!(err.is_err());
    assert_eq!(runner.messages().len(), 1);

    let outcome = runner.run_turn("hello again", &mut NoopEvents).await?;
    assert_eq!(outcome, TurnOutcome::Answer("second try works".into()));
    assert_eq!(runner.messages().len(), 3);
    Ok(())
}

#[tokio::test]
async fn requests_are_windowed_while_history_is_kept() -> Result<()> {
    let dir = TempDir::new()?;
    let replies = (0..8).map(|n| answer(&format!("reply {n}"))).collect();
    let provider = MockProvider::new(replies);
    let registry = ToolRegistry::new(WorkspaceScope::new(dir.path().to_path_buf(), None));
    let settings = RunnerSettings {
        max_history_items: 4,
        ..RunnerSettings::new("mock-model")
    };
    let mut runner = AgentRunner::new(provider.clone(), registry, "sys".to_string(), settings);

    for n in 0..8 {
        runner.run_turn(&format!("question {n}"), &mut NoopEvents).await?;
    }
    let last_request = provider.requests().pop();
    let sent = last_request.map(|request| request.messages).unwrap_or_default();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[0].role, MessageRole::System);
    assert_eq!(sent[4].content, "question 7");

    // system plus eight question/answer pairs
    assert_eq!(runner.messages().len(), 17);
    let store = ConversationStore::new(WorkspaceScope::new(dir.path().to_path_buf(), None));
    let saved = store.save(runner.messages(), Some("full"), runner.model()).await?;
    assert_eq!(saved.message_count, 17);
    Ok(())
}

#[tokio::test]
async fn failed_follow_up_request_keeps_partial_turn() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("readme.md"), "# hi\n")?;
    let provider = MockProvider::new(vec![
        tool_calls(&[("r1", "read_file_content", r#"{"file_path":"readme.md"}"#)]),
        Err(LLMError::Network("connection reset".to_string())),
        answer("The readme is a heading."),
    ]);
    let mut runner = runner(&dir, provider.clone());

    let err = runner.run_turn("summarize readme.md", &mut NoopEvents).await;
    assert!(err.is_err());
    let roles: Vec<MessageRole> = runner.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool
        ]
    );

    let outcome = runner.run_turn("try again", &mut NoopEvents).await?;
    assert_eq!(outcome, TurnOutcome::Answer("The readme is a heading.".into()));
    let retry = provider.requests().pop().map(|r| r.messages).unwrap_or_default();
    assert_eq!(retry.len(), 5);
    assert_eq!(retry[3].role, MessageRole::Tool);
    Ok(())
}

#[tokio::test]
async fn dump_messages_saves_the_live_history() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = MockProvider::new(vec![
        tool_calls(&[("d1", "dump_messages", r#"{"filename":"snapshot"}"#)]),
        answer("Saved."),
    ]);
    let mut runner = runner(&dir, provider);
    runner.run_turn("save our chat", &mut NoopEvents).await?;

    let store = ConversationStore::new(WorkspaceScope::new(dir.path().to_path_buf(), None));
    let loaded = store.load("snapshot").await?;
    // system, user, assistant with the dump call
    assert_eq!(loaded.messages.len(), 3);
    assert_eq!(loaded.messages[1].content, "save our chat");
    assert!(loaded.messages[2].has_tool_calls());
    Ok(())
}
