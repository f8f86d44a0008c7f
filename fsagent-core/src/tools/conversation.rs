//! Tool that lets the model save the running conversation

use super::traits::{Tool, ToolCategory};
use super::types::{DumpMessagesInput, parse_input};
use crate::config::constants::tools;
use crate::conversation::{ConversationError, ConversationStore, HistorySnapshot};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct DumpMessagesTool {
    store: ConversationStore,
    history: HistorySnapshot,
    model: String,
}

impl DumpMessagesTool {
    pub fn new(store: ConversationStore, history: HistorySnapshot, model: String) -> Self {
        Self {
            store,
            history,
            model,
        }
    }
}

#[async_trait]
impl Tool for DumpMessagesTool {
    async fn execute(&self, args: Value) -> Result<Value> {
        let input: DumpMessagesInput = parse_input(self.name(), args)?;
        let messages = self.history.messages();
        match self
            .store
            .save_with(
                &messages,
                input.filename.as_deref(),
                &self.model,
                input.use_focus_path,
            )
            .await
        {
            Ok(saved) => Ok(json!({
                "status": "success",
                "file_path": saved.path.display().to_string(),
                "message_count": saved.message_count,
                "message": format!("Conversation successfully saved to {}", saved.path.display()),
            })),
            Err(e @ ConversationError::OutsideBase(_)) => Ok(json!({
                "status": "error",
                "error": e.to_string(),
            })),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        tools::DUMP_MESSAGES
    }

    fn description(&self) -> &str {
        "Saves the current conversation to a JSON file in the conversations folder so it can be continued later."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "File name, e.g. 'my_conversation.json'. Defaults to a timestamped name."
                },
                "use_focus_path": {
                    "type": "boolean",
                    "description": "Save under the focus directory (default true) instead of the working directory."
                }
            }
        })
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Message;
    use crate::workspace::WorkspaceScope;
    use tempfile::TempDir;

    #[tokio::test]
    async fn saves_current_snapshot() -> Result<()> {
        let dir = TempDir::new()?;
        let store = ConversationStore::new(WorkspaceScope::new(dir.path().to_path_buf(), None));
        let history = HistorySnapshot::new();
        history.replace(&[Message::system("s".into()), Message::user("hi".into())]);
        let tool = DumpMessagesTool::new(store.clone(), history, "m".into());

        let result = tool.execute(json!({"filename": "dump"})).await?;
        assert_eq!(result["status"], "success");
        assert_eq!(result["message_count"], 2);
        assert_eq!(store.load("dump").await?.messages.len(), 2);
        Ok(())
    }
}
