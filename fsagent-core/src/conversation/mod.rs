//! Conversation persistence and history management

pub mod history;
pub mod store;

pub use history::{HistorySnapshot, prune_messages, request_window};
pub use store::{
    ConversationError, ConversationMetadata, ConversationStore, ConversationSummary,
    LoadedConversation, SavedConversation,
};
