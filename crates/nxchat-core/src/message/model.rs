//! Chat message model.

use crate::identity::VisitorIdentity;
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Typed by the visitor.
    User,
    /// Answer from the AI assistant.
    Bot,
    /// Reply from a human agent.
    Agent,
    /// Generated by the widget itself (joins, leaves, notices).
    System,
}

/// A single message shown in the widget.
///
/// The field layout matches the persisted history format, so a history written
/// by one load is readable by the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Creation time (RFC 3339)
    pub timestamp: String,
    pub visitor_id: String,
    pub session_id: String,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Creates a message stamped with the current time.
    ///
    /// Messages the visitor produced (user, system) start out read; incoming
    /// bot and agent replies start unread.
    pub fn new(
        message_type: MessageType,
        content: impl Into<String>,
        identity: &VisitorIdentity,
    ) -> Self {
        Self {
            content: content.into(),
            message_type,
            timestamp: chrono::Utc::now().to_rfc3339(),
            visitor_id: identity.visitor_id.clone(),
            session_id: identity.session_id.clone(),
            read: matches!(message_type, MessageType::User | MessageType::System),
        }
    }

    pub fn is_system(&self) -> bool {
        self.message_type == MessageType::System
    }

    /// Whether this message counts toward the unread badge.
    pub fn is_unread_reply(&self) -> bool {
        !self.read && matches!(self.message_type, MessageType::Agent | MessageType::Bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> VisitorIdentity {
        VisitorIdentity {
            visitor_id: "visitor_abc_1".into(),
            session_id: "session_1_abc".into(),
        }
    }

    #[test]
    fn test_wire_format() {
        let message = Message::new(MessageType::Agent, "Hi there", &identity());
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "agent");
        assert_eq!(json["visitorId"], "visitor_abc_1");
        assert_eq!(json["sessionId"], "session_1_abc");
        assert_eq!(json["read"], false);
    }

    #[test]
    fn test_missing_read_flag_defaults_to_false() {
        let message: Message = serde_json::from_str(
            r#"{"content":"x","type":"bot","timestamp":"2024-01-01T00:00:00Z","visitorId":"v","sessionId":"s"}"#,
        )
        .unwrap();
        assert!(!message.read);
        assert!(message.is_unread_reply());
    }

    #[test]
    fn test_own_messages_start_read() {
        assert!(Message::new(MessageType::User, "hello", &identity()).read);
        assert!(Message::new(MessageType::System, "note", &identity()).read);
    }
}
