//! Conversation flags.

use serde::{Deserialize, Serialize};

/// Who is handling the conversation, and what the widget knows about agents.
///
/// In steady state `ai_disabled == agent_joined`: the AI and a human agent
/// never handle the same conversation. Right after a transfer request both are
/// set before the agent has confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub agent_joined: bool,
    pub ai_disabled: bool,
    pub chat_session_active: bool,
    pub has_online_agents: bool,
    pub agent_status_checked: bool,
}

impl ConversationState {
    /// Whether a visitor message should go to the AI assistant.
    pub fn ai_handles_messages(&self) -> bool {
        !self.agent_joined && !self.ai_disabled
    }
}
