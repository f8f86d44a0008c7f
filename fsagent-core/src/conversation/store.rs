//! Saving and loading conversations as JSON files

use crate::config::constants::paths::CONVERSATIONS_DIR;
use crate::llm::provider::Message;
use crate::workspace::WorkspaceScope;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Conversation file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Conversation file {} is not valid: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Conversation path '{0}' is outside the allowed directory")]
    OutsideBase(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize conversation: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConversationError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
struct ConversationFile<'a> {
    metadata: ConversationMetadata,
    messages: &'a [Message],
}

/// Either format accepted on load
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredConversation {
    Structured {
        #[serde(default)]
        metadata: Option<ConversationMetadata>,
        messages: Vec<Message>,
    },
    Bare(Vec<Message>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedConversation {
    pub path: PathBuf,
    pub message_count: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedConversation {
    pub path: PathBuf,
    pub messages: Vec<Message>,
    pub metadata: Option<ConversationMetadata>,
}

#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub name: String,
    pub path: PathBuf,
    pub modified: DateTime<Local>,
    pub size: u64,
}

/// Conversation files under `conversations/` in the base directory
#[derive(Debug, Clone)]
pub struct ConversationStore {
    scope: WorkspaceScope,
}

fn with_json_extension(filename: &str) -> String {
    let trimmed = filename.trim();
    if trimmed.ends_with(".json") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.json")
    }
}

fn default_filename() -> String {
    format!("conversation_{}.json", Local::now().format("%Y%m%d_%H%M%S"))
}

impl ConversationStore {
    pub fn new(scope: WorkspaceScope) -> Self {
        Self { scope }
    }

    pub fn directory(&self, use_focus_path: bool) -> PathBuf {
        self.scope.base_for(use_focus_path).join(CONVERSATIONS_DIR)
    }

    /// Save into the base directory's conversation folder
    pub async fn save(
        &self,
        messages: &[Message],
        filename: Option<&str>,
        model: &str,
    ) -> Result<SavedConversation, ConversationError> {
        self.save_with(messages, filename, model, true).await
    }

    pub async fn save_with(
        &self,
        messages: &[Message],
        filename: Option<&str>,
        model: &str,
        use_focus_path: bool,
    ) -> Result<SavedConversation, ConversationError> {
        let name = match filename.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => with_json_extension(name),
            None => default_filename(),
        };
        let relative = Path::new(CONVERSATIONS_DIR).join(&name);
        let resolved = self
            .scope
            .resolve(&relative.to_string_lossy(), use_focus_path);
        let directory = self.directory(use_focus_path);
        if !resolved.inside_base || !resolved.resolved.starts_with(&directory) {
            return Err(ConversationError::OutsideBase(name));
        }
        let path = resolved.resolved;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConversationError::io(parent, e))?;
        }

        let payload = ConversationFile {
            metadata: ConversationMetadata {
                timestamp: Local::now().to_rfc3339(),
                model: Some(model.to_string()),
                message_count: messages.len(),
            },
            messages,
        };
        let json = serde_json::to_string_pretty(&payload)?;
        fs::write(&path, json)
            .await
            .map_err(|e| ConversationError::io(&path, e))?;

        info!(path = %path.display(), messages = messages.len(), "conversation saved");
        Ok(SavedConversation {
            path,
            message_count: messages.len(),
        })
    }

    /// Candidate locations for a conversation file, in lookup order
    fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        let name = with_json_extension(filename);
        let base = self.scope.base_dir();
        let mut candidates = vec![self.directory(true).join(&name), base.join(&name)];
        let literal = PathBuf::from(filename.trim());
        if literal.is_absolute() {
            candidates.push(literal);
        } else {
            candidates.push(self.scope.cwd().join(literal));
        }
        candidates.dedup();
        candidates
    }

    /// Load a conversation by name, looking in the conversation folder, then
    /// the base directory, then the literal path
    pub async fn load(&self, filename: &str) -> Result<LoadedConversation, ConversationError> {
        let candidates = self.candidates(filename);
        let mut found = None;
        for candidate in &candidates {
            if fs::metadata(candidate).await.is_ok_and(|meta| meta.is_file()) {
                found = Some(candidate.clone());
                break;
            }
            debug!(path = %candidate.display(), "conversation not found here");
        }
        let Some(path) = found else {
            return Err(ConversationError::NotFound {
                path: candidates
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| PathBuf::from(filename)),
            });
        };

        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| ConversationError::io(&path, e))?;
        let stored: StoredConversation =
            serde_json::from_str(&text).map_err(|source| ConversationError::Malformed {
                path: path.clone(),
                source,
            })?;
        let (messages, metadata) = match stored {
            StoredConversation::Structured { metadata, messages } => (messages, metadata),
            StoredConversation::Bare(messages) => (messages, None),
        };

        info!(path = %path.display(), messages = messages.len(), "conversation loaded");
        Ok(LoadedConversation {
            path,
            messages,
            metadata,
        })
    }

    /// Saved conversations, newest first
    pub async fn list(&self) -> Result<Vec<ConversationSummary>, ConversationError> {
        let directory = self.directory(true);
        let mut entries = match fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConversationError::io(&directory, e)),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ConversationError::io(&directory, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map(DateTime::<Local>::from)
                .unwrap_or_else(|_| Local::now());
            summaries.push(ConversationSummary {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                modified,
                size: metadata.len(),
            });
        }
        summaries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConversationStore {
        ConversationStore::new(WorkspaceScope::new(dir.path().to_path_buf(), None))
    }

    fn sample() -> Vec<Message> {
        vec![
            Message::system("prompt".into()),
            Message::user("hi".into()),
            Message::assistant("hello".into()),
        ]
    }

    #[tokio::test]
    async fn save_then_load_structured() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        let saved = store.save(&sample(), Some("session"), "test/model").await?;
        assert_eq!(saved.message_count, 3);
        assert!(saved.path.ends_with("conversations/session.json"));

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&saved.path)?)?;
        assert_eq!(raw["metadata"]["model"], "test/model");
        assert_eq!(raw["metadata"]["message_count"], 3);

        let loaded = store.load("session").await?;
        assert_eq!(loaded.messages, sample());
        assert_eq!(
            loaded.metadata.and_then(|meta| meta.model).as_deref(),
            Some("test/model")
        );
        Ok(())
    }

    #[tokio::test]
    async fn default_name_is_timestamped() -> Result<()> {
        let dir = TempDir::new()?;
        let saved = store(&dir).save(&sample(), None, "m").await?;
        let name = saved
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with("conversation_"));
        assert!(name.ends_with(".json"));
        Ok(())
    }

    #[tokio::test]
    async fn loads_bare_array_from_base_directory() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(
            dir.path().join("old.json"),
            serde_json::to_string(&sample())?,
        )?;
        let loaded = store(&dir).load("old.json").await?;
        assert_eq!(loaded.messages.len(), 3);
        assert!(loaded.metadata.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_and_malformed_files() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        assert!(matches!(
            store.load("nope").await,
            Err(ConversationError::NotFound { .. })
        ));

        std::fs::create_dir(dir.path().join(CONVERSATIONS_DIR))?;
        std::fs::write(dir.path().join("conversations/bad.json"), "{not json")?;
        assert!(matches!(
            store.load("bad").await,
            Err(ConversationError::Malformed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn refuses_names_that_escape_the_folder() -> Result<()> {
        let dir = TempDir::new()?;
        let result = store(&dir).save(&sample(), Some("../../escape"), "m").await;
        assert!(matches!(result, Err(ConversationError::OutsideBase(_))));
        Ok(())
    }

    #[tokio::test]
    async fn lists_saved_conversations() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        assert!(store.list().await?.is_empty());
        store.save(&sample(), Some("a"), "m").await?;
        store.save(&sample(), Some("b"), "m").await?;
        std::fs::write(dir.path().join("conversations/notes.txt"), "")?;

        let names: Vec<String> = store.list().await?.into_iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.json".to_string()));
        assert!(names.contains(&"b.json".to_string()));
        Ok(())
    }
}
