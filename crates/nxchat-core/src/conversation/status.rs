//! Session status as classified by the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The backend's view of the visitor's previous conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// A human agent still owns the conversation.
    ActiveWithAgent,
    /// A human agent owned the conversation but it has been closed.
    EndedWithAgent,
    /// The AI assistant owns the conversation.
    ActiveWithAi,
    #[default]
    New,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Agent identifier as sent by the backend (numeric or string keys both occur).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentId::Numeric(id) => write!(f, "{id}"),
            AgentId::Text(id) => f.write_str(id),
        }
    }
}

/// Result of `widget/visitor/session-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResult {
    pub is_new_visitor: bool,
    #[serde(default)]
    pub session_status: SessionStatus,
    #[serde(default)]
    pub assigned_agent_id: Option<AgentId>,
}

impl SessionStatusResult {
    /// The fallback used whenever the status cannot be resolved.
    pub fn new_visitor() -> Self {
        Self {
            is_new_visitor: true,
            session_status: SessionStatus::New,
            assigned_agent_id: None,
        }
    }
}

/// Which load flow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fresh AI conversation.
    New,
    /// Reattach to the human agent still owning the conversation.
    ReconnectAgent,
    /// Continue the AI conversation.
    ResumeAi,
    /// The previous agent conversation has ended; starts over like `New`.
    ResumeEnded,
}

impl Flow {
    /// Maps the backend's classification onto a load flow.
    pub fn classify(result: &SessionStatusResult) -> Self {
        if result.is_new_visitor {
            return Flow::New;
        }
        match result.session_status {
            SessionStatus::ActiveWithAgent => Flow::ReconnectAgent,
            SessionStatus::EndedWithAgent => Flow::ResumeEnded,
            SessionStatus::ActiveWithAi => Flow::ResumeAi,
            SessionStatus::New | SessionStatus::Unknown => Flow::New,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SessionStatusResult {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_classify() {
        let cases = [
            (r#"{"isNewVisitor":true,"sessionStatus":"active_with_agent"}"#, Flow::New),
            (
                r#"{"isNewVisitor":false,"sessionStatus":"active_with_agent","assignedAgentId":7}"#,
                Flow::ReconnectAgent,
            ),
            (r#"{"isNewVisitor":false,"sessionStatus":"ended_with_agent"}"#, Flow::ResumeEnded),
            (r#"{"isNewVisitor":false,"sessionStatus":"active_with_ai"}"#, Flow::ResumeAi),
            (r#"{"isNewVisitor":false,"sessionStatus":"new"}"#, Flow::New),
            (r#"{"isNewVisitor":false,"sessionStatus":"archived"}"#, Flow::New),
            (r#"{"isNewVisitor":false}"#, Flow::New),
        ];

        for (json, expected) in cases {
            assert_eq!(Flow::classify(&parse(json)), expected, "{json}");
        }
    }

    #[test]
    fn test_agent_id_accepts_numbers_and_strings() {
        let numeric = parse(r#"{"isNewVisitor":false,"assignedAgentId":7}"#);
        assert_eq!(numeric.assigned_agent_id, Some(AgentId::Numeric(7)));

        let text = parse(r#"{"isNewVisitor":false,"assignedAgentId":"agent-7"}"#);
        assert_eq!(text.assigned_agent_id.unwrap().to_string(), "agent-7");
    }
}
