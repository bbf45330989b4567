//! Socket events.

use super::ChatWidget;
use crate::alert;
use nxchat_core::conversation::Transition;
use nxchat_core::message::MessageType;
use nxchat_core::transport::{InboundEvent, OutboundEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

impl ChatWidget {
    /// Feeds transport events into the widget until the channel closes.
    pub fn spawn_event_loop(
        &self,
        mut events: mpsc::UnboundedReceiver<InboundEvent>,
    ) -> JoinHandle<()> {
        let widget = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                widget.handle_inbound(event).await;
            }
            tracing::debug!("[Widget] Transport event stream ended");
        })
    }

    /// Handles one transport event.
    ///
    /// Agent events addressed to another visitor are ignored.
    pub async fn handle_inbound(&self, event: InboundEvent) {
        if let Some(target) = event.visitor_id()
            && target != self.inner.identity.visitor_id
        {
            tracing::trace!("[Widget] Ignoring event for visitor {}", target);
            return;
        }

        match event {
            InboundEvent::Connected => {
                // rooms do not survive reconnects, so join on every connect
                self.emit(OutboundEvent::JoinVisitorRoom {
                    visitor_id: self.inner.identity.visitor_id.clone(),
                })
                .await;
                self.inner.ready.mark_connected();
            }
            InboundEvent::Disconnected { reason } => {
                tracing::info!("[Widget] Socket disconnected: {}", reason);
                self.inner.ready.mark_disconnected();
            }
            InboundEvent::ConnectError { message } => {
                tracing::warn!(
                    "[Widget] Realtime connection unavailable, continuing over REST: {}",
                    message
                );
                self.inner.ready.mark_socket_failed();
            }
            InboundEvent::VisitorRoomJoined { .. } => {
                tracing::debug!("[Widget] Joined visitor room");
            }
            InboundEvent::AgentJoin(presence) => {
                self.dispatch(Transition::AgentJoined {
                    agent_name: presence.agent_name,
                })
                .await;
                self.alert();
            }
            InboundEvent::AgentLeave(presence) => {
                self.dispatch(Transition::AgentLeft {
                    agent_name: presence.agent_name,
                })
                .await;
            }
            InboundEvent::AgentMessage(message) => {
                self.append(MessageType::Agent, message.message.content())
                    .await;
                self.dispatch(Transition::AgentReplied).await;
                self.alert();
            }
        }
    }

    fn alert(&self) {
        alert::notify(self.inner.services.alerts.as_ref());
    }
}
