use crate::llm::provider::{Message, MessageRole};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared read-only view of the running history, refreshed by the turn runner
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    inner: Arc<RwLock<Vec<Message>>>,
}

impl HistorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, messages: &[Message]) {
        let mut guard = self.inner.write();
        guard.clear();
        guard.extend_from_slice(messages);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Keep a leading system message plus the most recent `max_items` messages.
///
/// Tool messages at the start of the kept window lost their assistant call
/// and are dropped as well, since the API rejects them. When that would leave
/// nothing after the system message, the window reaches back to the assistant
/// call instead. The newest message is always kept.
pub fn prune_messages(messages: &mut Vec<Message>, max_items: usize) {
    let max_items = max_items.max(1);
    let has_system = messages
        .first()
        .is_some_and(|message| message.role == MessageRole::System);
    let offset = usize::from(has_system);
    let body_len = messages.len() - offset;
    if body_len <= max_items {
        return;
    }

    let cut = offset + (body_len - max_items);
    let mut start = cut;
    while start < messages.len() && messages[start].role == MessageRole::Tool {
        start += 1;
    }
    if start == messages.len() {
        start = cut;
        while start > offset && messages[start].role == MessageRole::Tool {
            start -= 1;
        }
    }
    messages.drain(offset..start);
}

/// Pruned copy of `messages` for one request; the stored history is untouched
pub fn request_window(messages: &[Message], max_items: usize) -> Vec<Message> {
    let mut window = messages.to_vec();
    prune_messages(&mut window, max_items);
    window
}
