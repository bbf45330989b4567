//! The conversation reducer.
//!
//! Every change to [`ConversationState`] goes through
//! [`ConversationState::apply`]. The reducer is pure: it returns the next state
//! plus the side effects the widget must carry out, and never touches I/O.

use super::state::ConversationState;
use super::status::Flow;

/// System notices produced by the reducer and the widget.
pub mod notices {
    pub const WELCOME_BACK: &str =
        "Welcome back! You're reconnected with our support team.";
    pub const AGENT_STILL_WAITING: &str =
        "Your message has been sent to our support team. An agent will respond shortly.";
    pub const CONNECTING_TO_AGENT: &str = "Connecting you with a human agent...";
    pub const NO_AGENTS_ONLINE: &str =
        "All of our agents are currently offline. I'll keep helping you in the meantime.";
    pub const TRANSFER_FAILED: &str =
        "We couldn't reach a human agent right now. I'll keep helping you in the meantime.";
    pub const AI_UNAVAILABLE: &str =
        "Sorry, I'm having trouble responding right now. Please try again in a moment.";

    pub fn agent_joined(agent_name: &str) -> String {
        format!("{agent_name} has joined the chat")
    }

    pub fn agent_left(agent_name: &str) -> String {
        format!("{agent_name} has left the chat. You're now chatting with our AI assistant.")
    }
}

const FALLBACK_AGENT_NAME: &str = "An agent";

/// Something that happened to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The one-time load flow was chosen.
    Enter(Flow),
    /// `agent:join` for this visitor.
    AgentJoined { agent_name: Option<String> },
    /// `agent:leave` for this visitor.
    AgentLeft { agent_name: Option<String> },
    /// `agent:message` for this visitor.
    AgentReplied,
    /// An agent-availability check finished (failures count as offline).
    AvailabilityChecked { online: bool },
    /// The backend accepted a transfer request; the agent has not confirmed yet.
    TransferAccepted,
    /// The visitor ended the chat.
    ChatEnded,
}

/// Work the widget must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Restore persisted history into the message store.
    LoadHistory,
    /// Show the tenant's welcome message if the history is empty.
    ShowWelcome,
    /// Ask the backend whether agents are online (non-blocking).
    CheckAgentAvailability,
    /// Cancel the pending agent-response watchdog.
    ClearWatchdog,
    /// Append (and persist) a system message.
    AppendSystemMessage(String),
}

impl ConversationState {
    /// Computes the state after `transition` and the effects to run.
    pub fn apply(&self, transition: Transition) -> (ConversationState, Vec<Effect>) {
        let mut next = *self;

        let effects = match transition {
            Transition::Enter(Flow::New | Flow::ResumeEnded) => {
                next.agent_joined = false;
                next.ai_disabled = false;
                next.chat_session_active = false;
                vec![
                    Effect::LoadHistory,
                    Effect::ShowWelcome,
                    Effect::CheckAgentAvailability,
                ]
            }
            Transition::Enter(Flow::ResumeAi) => {
                next.agent_joined = false;
                next.ai_disabled = false;
                next.chat_session_active = true;
                vec![Effect::LoadHistory]
            }
            Transition::Enter(Flow::ReconnectAgent) => {
                next.agent_joined = true;
                next.ai_disabled = true;
                next.chat_session_active = true;
                vec![
                    Effect::LoadHistory,
                    Effect::ClearWatchdog,
                    Effect::AppendSystemMessage(notices::WELCOME_BACK.to_string()),
                ]
            }
            Transition::AgentJoined { agent_name } => {
                next.agent_joined = true;
                next.ai_disabled = true;
                next.chat_session_active = true;
                next.agent_status_checked = true;
                next.has_online_agents = true;
                let name = agent_name.as_deref().unwrap_or(FALLBACK_AGENT_NAME);
                vec![
                    Effect::ClearWatchdog,
                    Effect::AppendSystemMessage(notices::agent_joined(name)),
                ]
            }
            Transition::AgentLeft { agent_name } => {
                next.agent_joined = false;
                next.ai_disabled = false;
                next.chat_session_active = false;
                let name = agent_name.as_deref().unwrap_or(FALLBACK_AGENT_NAME);
                vec![
                    Effect::ClearWatchdog,
                    Effect::CheckAgentAvailability,
                    Effect::AppendSystemMessage(notices::agent_left(name)),
                ]
            }
            Transition::AgentReplied => vec![Effect::ClearWatchdog],
            Transition::AvailabilityChecked { online } => {
                next.has_online_agents = online;
                next.agent_status_checked = true;
                Vec::new()
            }
            Transition::TransferAccepted => {
                next.agent_joined = true;
                next.ai_disabled = true;
                next.chat_session_active = true;
                vec![Effect::AppendSystemMessage(
                    notices::CONNECTING_TO_AGENT.to_string(),
                )]
            }
            Transition::ChatEnded => {
                next.agent_joined = false;
                next.ai_disabled = false;
                next.chat_session_active = false;
                vec![Effect::ClearWatchdog]
            }
        };

        (next, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> ConversationState {
        ConversationState::default()
            .apply(Transition::AgentJoined {
                agent_name: Some("Dana".into()),
            })
            .0
    }

    fn system_messages(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::AppendSystemMessage(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_reconnect_agent_entry() {
        let (state, effects) =
            ConversationState::default().apply(Transition::Enter(Flow::ReconnectAgent));

        assert!(state.agent_joined);
        assert!(state.ai_disabled);
        assert!(state.chat_session_active);
        assert_eq!(system_messages(&effects), vec![notices::WELCOME_BACK]);
        assert!(effects.contains(&Effect::ClearWatchdog));
        assert!(effects.contains(&Effect::LoadHistory));
    }

    #[test]
    fn test_resume_ai_entry() {
        let (state, effects) = joined().apply(Transition::Enter(Flow::ResumeAi));

        assert!(!state.agent_joined);
        assert!(!state.ai_disabled);
        assert!(state.chat_session_active);
        assert_eq!(effects, vec![Effect::LoadHistory]);
    }

    #[test]
    fn test_new_and_ended_entries_match() {
        let from = joined();
        let (new_state, new_effects) = from.apply(Transition::Enter(Flow::New));
        let (ended_state, ended_effects) = from.apply(Transition::Enter(Flow::ResumeEnded));

        assert_eq!(new_state, ended_state);
        assert_eq!(new_effects, ended_effects);
        assert!(!new_state.agent_joined);
        assert!(!new_state.ai_disabled);
        assert!(!new_state.chat_session_active);
        assert!(new_effects.contains(&Effect::CheckAgentAvailability));
        assert!(system_messages(&new_effects).is_empty());
    }

    #[test]
    fn test_agent_join_sets_every_flag() {
        let (state, effects) = ConversationState::default().apply(Transition::AgentJoined {
            agent_name: Some("Dana".into()),
        });

        assert_eq!(
            state,
            ConversationState {
                agent_joined: true,
                ai_disabled: true,
                chat_session_active: true,
                has_online_agents: true,
                agent_status_checked: true,
            }
        );
        assert_eq!(system_messages(&effects), vec!["Dana has joined the chat"]);
    }

    #[test]
    fn test_agent_leave_hands_back_to_ai() {
        let (state, effects) = joined().apply(Transition::AgentLeft { agent_name: None });

        assert!(state.ai_handles_messages());
        assert!(!state.chat_session_active);
        assert!(effects.contains(&Effect::CheckAgentAvailability));
        assert!(effects.contains(&Effect::ClearWatchdog));
        assert!(system_messages(&effects)[0].starts_with("An agent has left"));
    }

    #[test]
    fn test_agent_reply_only_clears_watchdog() {
        let before = joined();
        let (after, effects) = before.apply(Transition::AgentReplied);
        assert_eq!(before, after);
        assert_eq!(effects, vec![Effect::ClearWatchdog]);
    }

    #[test]
    fn test_transfer_window() {
        let (state, _) = ConversationState::default().apply(Transition::TransferAccepted);
        assert!(state.agent_joined && state.ai_disabled);
        assert!(!state.ai_handles_messages());
    }

    #[test]
    fn test_availability_and_chat_end() {
        let (state, _) =
            ConversationState::default().apply(Transition::AvailabilityChecked { online: true });
        assert!(state.has_online_agents && state.agent_status_checked);

        let (ended, effects) = joined().apply(Transition::ChatEnded);
        assert!(!ended.agent_joined && !ended.ai_disabled && !ended.chat_session_active);
        assert_eq!(effects, vec![Effect::ClearWatchdog]);
    }
}
