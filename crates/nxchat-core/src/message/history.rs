//! Bounded message history.

use super::model::Message;
use crate::error::Result;
use std::collections::VecDeque;

/// Maximum number of messages kept (and persisted) per visitor.
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// The local conversation log.
///
/// Holds at most [`MAX_HISTORY_ENTRIES`] messages; appending beyond that drops
/// the oldest. A system message identical to the system message right before it
/// is not stored again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageHistory {
    messages: VecDeque<Message>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    ///
    /// # Returns
    ///
    /// `false` if the message was suppressed as a duplicate system message.
    pub fn push(&mut self, message: Message) -> bool {
        if message.is_system() {
            if let Some(last) = self.messages.back() {
                if last.is_system() && last.content == message.content {
                    return false;
                }
            }
        }

        self.messages.push_back(message);
        while self.messages.len() > MAX_HISTORY_ENTRIES {
            self.messages.pop_front();
        }
        true
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Marks every message read. Returns how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for message in self.messages.iter_mut().filter(|m| !m.read) {
            message.read = true;
            changed += 1;
        }
        changed
    }

    /// Number of unread agent/bot replies.
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_unread_reply()).count()
    }

    /// Serializes to the persisted JSON array format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.messages)?)
    }

    /// Parses a persisted history, keeping only the newest entries if it is oversized.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `raw` is not a JSON array of messages.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut messages: VecDeque<Message> = serde_json::from_str(raw)?;
        while messages.len() > MAX_HISTORY_ENTRIES {
            messages.pop_front();
        }
        Ok(Self { messages })
    }

    /// Like [`from_json`](Self::from_json), but a missing or corrupt value
    /// yields an empty history (logged).
    pub fn restore(raw: Option<&str>) -> Self {
        match raw {
            None => Self::new(),
            Some(raw) => Self::from_json(raw).unwrap_or_else(|e| {
                tracing::warn!("[MessageHistory] Discarding unreadable history: {}", e);
                Self::new()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::VisitorIdentity;
    use crate::message::MessageType;

    fn identity() -> VisitorIdentity {
        VisitorIdentity {
            visitor_id: "visitor_test_1".into(),
            session_id: "session_1_test".into(),
        }
    }

    fn msg(kind: MessageType, content: &str) -> Message {
        Message::new(kind, content, &identity())
    }

    #[test]
    fn test_duplicate_system_messages_collapse() {
        let mut history = MessageHistory::new();

        assert!(history.push(msg(MessageType::System, "Alice has joined the chat")));
        assert!(!history.push(msg(MessageType::System, "Alice has joined the chat")));

        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_only_consecutive_system_messages_collapse() {
        let mut history = MessageHistory::new();

        history.push(msg(MessageType::System, "note"));
        history.push(msg(MessageType::User, "hi"));
        history.push(msg(MessageType::System, "note"));
        // identical user messages are real messages
        history.push(msg(MessageType::User, "hi"));
        history.push(msg(MessageType::User, "hi"));

        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = MessageHistory::new();
        for i in 0..=MAX_HISTORY_ENTRIES {
            history.push(msg(MessageType::User, &format!("message {i}")));
        }

        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.messages().next().unwrap().content, "message 1");
        assert_eq!(history.last().unwrap().content, "message 50");
    }

    #[test]
    fn test_restore_corrupt_history_is_empty() {
        assert!(MessageHistory::restore(Some("{not an array")).is_empty());
        assert!(MessageHistory::restore(None).is_empty());
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut history = MessageHistory::new();
        history.push(msg(MessageType::User, "first"));
        history.push(msg(MessageType::Bot, "second"));

        let restored = MessageHistory::restore(Some(&history.to_json().unwrap()));
        let contents: Vec<_> = restored.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_unread_tracking() {
        let mut history = MessageHistory::new();
        history.push(msg(MessageType::User, "question"));
        history.push(msg(MessageType::Bot, "answer"));
        history.push(msg(MessageType::Agent, "follow-up"));

        assert_eq!(history.unread_count(), 2);
        assert_eq!(history.mark_all_read(), 2);
        assert_eq!(history.unread_count(), 0);
    }
}
