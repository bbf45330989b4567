//! Visitor messages: routing to the agent or the AI, and agent transfers.

use super::ChatWidget;
use nxchat_core::api::{AiRequest, MessageRecord, TransferRequest};
use nxchat_core::conversation::{Transition, notices};
use nxchat_core::message::{Message, MessageType};
use nxchat_core::transfer::find_transfer_trigger;

/// Where a visitor message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRoute {
    /// Blank input; nothing was sent.
    Ignored,
    /// A human agent owns the conversation; the watchdog is armed.
    Agent,
    /// The AI answered. Carries the transfer attempt if the exchange asked for a human.
    Ai { transfer: Option<TransferResult> },
    /// The AI call failed; the visitor was told to retry.
    AiUnavailable,
    /// No handler: the tenant has AI switched off and no agent has joined.
    Unhandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Requested,
    NoAgentsOnline,
    Failed,
}

impl ChatWidget {
    /// Sends a visitor message.
    pub async fn send_message(&self, text: &str) -> SendRoute {
        let text = text.trim();
        if text.is_empty() {
            return SendRoute::Ignored;
        }

        let message = Message::new(MessageType::User, text, &self.inner.identity);
        self.append_message(message.clone()).await;
        self.forward_to_inbox(&message).await;

        let state = self.state().await;
        if state.agent_joined {
            self.arm_watchdog();
            return SendRoute::Agent;
        }

        let ai_enabled = self.inner.settings.read().await.ai_enabled;
        if !ai_enabled || state.ai_disabled {
            tracing::debug!("[Widget] AI off for this conversation, message left for the inbox");
            return SendRoute::Unhandled;
        }

        if !state.agent_status_checked {
            self.check_agent_availability().await;
        }

        let request = AiRequest {
            visitor: self.visitor_ref(),
            message: text.to_string(),
        };
        let reply = match self.inner.services.api.ask_ai(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("[Widget] AI request failed: {}", e);
                self.append(MessageType::System, notices::AI_UNAVAILABLE).await;
                return SendRoute::AiUnavailable;
            }
        };

        self.append(MessageType::Bot, reply.response.as_str()).await;

        let transfer = match find_transfer_trigger(text, &reply.response) {
            Some(keyword) => {
                tracing::info!("[Widget] Transfer keyword '{}' detected", keyword);
                Some(self.request_transfer(text).await)
            }
            None => None,
        };
        SendRoute::Ai { transfer }
    }

    /// Asks the backend to hand the conversation to a human agent.
    pub async fn request_transfer(&self, reason: &str) -> TransferResult {
        if !self.check_agent_availability().await {
            self.append(MessageType::System, notices::NO_AGENTS_ONLINE).await;
            return TransferResult::NoAgentsOnline;
        }

        let request = TransferRequest {
            visitor: self.visitor_ref(),
            reason: reason.to_string(),
        };
        match self.inner.services.api.request_agent(&request).await {
            Ok(outcome) => {
                tracing::info!(
                    "[Widget] Transfer requested (queued: {}, agent: {:?})",
                    outcome.queued,
                    outcome.agent_name
                );
                self.dispatch(Transition::TransferAccepted).await;
                TransferResult::Requested
            }
            Err(e) => {
                tracing::warn!("[Widget] Transfer request failed: {}", e);
                self.append(MessageType::System, notices::TRANSFER_FAILED).await;
                TransferResult::Failed
            }
        }
    }

    /// Refreshes agent availability. Failures count as offline.
    pub async fn check_agent_availability(&self) -> bool {
        let online = match self
            .inner
            .services
            .api
            .agent_availability(&self.inner.config.tenant_id)
            .await
        {
            Ok(availability) => {
                tracing::debug!(
                    "[Widget] {} agent(s) online",
                    availability.online_agents
                );
                availability.has_online_agents
            }
            Err(e) => {
                tracing::warn!("[Widget] Agent availability check failed: {}", e);
                false
            }
        };
        // AvailabilityChecked has no effects
        self.transition(Transition::AvailabilityChecked { online })
            .await;
        online
    }

    /// Best-effort copy of the message into the backend inbox.
    async fn forward_to_inbox(&self, message: &Message) {
        let record = MessageRecord::from_message(&self.inner.config.tenant_id, message);
        if let Err(e) = self.inner.services.api.save_message(&record).await {
            tracing::warn!("[Widget] Failed to forward message to inbox: {}", e);
        }
    }
}
