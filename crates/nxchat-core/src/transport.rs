//! Realtime transport contract.
//!
//! The widget keeps one socket for room membership, live agent events and
//! presence broadcasts. Event names and payload shapes are defined here so the
//! Socket.io client in `nxchat-interaction` only deals with framing.

use crate::api::{PageActivity, StatusUpdate, TypingUpdate};
use crate::error::{NxChatError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of `agent:join` / `agent:leave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPresence {
    pub visitor_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Body of `agent:message`; older servers send a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentMessageBody {
    Text(String),
    Structured { content: String },
}

impl AgentMessageBody {
    pub fn content(&self) -> &str {
        match self {
            AgentMessageBody::Text(text) => text,
            AgentMessageBody::Structured { content } => content,
        }
    }
}

/// Payload of `agent:message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentChatMessage {
    pub visitor_id: String,
    pub message: AgentMessageBody,
    #[serde(default)]
    pub agent_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomJoined {
    #[serde(default)]
    visitor_id: Option<String>,
}

/// Everything the transport delivers to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `connect`: the namespace handshake completed.
    Connected,
    /// `disconnect`
    Disconnected { reason: String },
    /// `connect_error`
    ConnectError { message: String },
    /// `visitor_room_joined`
    VisitorRoomJoined { visitor_id: Option<String> },
    /// `agent:join`
    AgentJoin(AgentPresence),
    /// `agent:leave`
    AgentLeave(AgentPresence),
    /// `agent:message`
    AgentMessage(AgentChatMessage),
}

impl InboundEvent {
    /// Decodes a server-emitted event.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))`: A known event
    /// - `Ok(None)`: An event the widget does not listen to
    /// - `Err(_)`: A known event with a malformed payload
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>> {
        let event = match name {
            "visitor_room_joined" => {
                let joined: RoomJoined = if payload.is_null() {
                    RoomJoined { visitor_id: None }
                } else {
                    from_payload(name, payload)?
                };
                InboundEvent::VisitorRoomJoined {
                    visitor_id: joined.visitor_id,
                }
            }
            "agent:join" => InboundEvent::AgentJoin(from_payload(name, payload)?),
            "agent:leave" => InboundEvent::AgentLeave(from_payload(name, payload)?),
            "agent:message" => InboundEvent::AgentMessage(from_payload(name, payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Visitor the event is addressed to, for events that carry one.
    pub fn visitor_id(&self) -> Option<&str> {
        match self {
            InboundEvent::AgentJoin(p) | InboundEvent::AgentLeave(p) => Some(&p.visitor_id),
            InboundEvent::AgentMessage(m) => Some(&m.visitor_id),
            InboundEvent::VisitorRoomJoined { visitor_id } => visitor_id.as_deref(),
            _ => None,
        }
    }
}

fn from_payload<T: for<'de> Deserialize<'de>>(name: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| {
        NxChatError::serialization("socket.io", format!("malformed '{name}' payload: {e}"))
    })
}

/// Everything the widget emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    JoinVisitorRoom { visitor_id: String },
    VisitorActivity(PageActivity),
    VisitorStatus(StatusUpdate),
    VisitorTyping(TypingUpdate),
    WidgetStatus {
        visitor_id: String,
        tenant_id: String,
        is_open: bool,
    },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinVisitorRoom { .. } => "join_visitor_room",
            OutboundEvent::VisitorActivity(_) => "visitor:activity",
            OutboundEvent::VisitorStatus(_) => "visitor:status",
            OutboundEvent::VisitorTyping(_) => "visitor:typing",
            OutboundEvent::WidgetStatus { .. } => "widget:status",
        }
    }

    pub fn payload(&self) -> Result<Value> {
        let value = match self {
            OutboundEvent::JoinVisitorRoom { visitor_id } => {
                serde_json::json!({ "visitorId": visitor_id })
            }
            OutboundEvent::VisitorActivity(activity) => serde_json::to_value(activity)?,
            OutboundEvent::VisitorStatus(update) => serde_json::to_value(update)?,
            OutboundEvent::VisitorTyping(update) => serde_json::to_value(update)?,
            OutboundEvent::WidgetStatus {
                visitor_id,
                tenant_id,
                is_open,
            } => serde_json::json!({
                "visitorId": visitor_id,
                "tenantId": tenant_id,
                "isOpen": is_open,
            }),
        };
        Ok(value)
    }
}

/// The socket as seen by the widget.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends an event. Fails when the socket is not connected.
    async fn emit(&self, event: OutboundEvent) -> Result<()>;

    /// Whether the namespace handshake has completed and not dropped since.
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_agent_events() {
        let event = InboundEvent::decode(
            "agent:join",
            json!({"visitorId": "visitor_a_1", "agentName": "Dana"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.visitor_id(), Some("visitor_a_1"));
        assert!(matches!(
            event,
            InboundEvent::AgentJoin(ref p) if p.agent_name.as_deref() == Some("Dana")
        ));

        let event = InboundEvent::decode(
            "agent:message",
            json!({"visitorId": "visitor_a_1", "message": "On it!"}),
        )
        .unwrap()
        .unwrap();
        match event {
            InboundEvent::AgentMessage(m) => assert_eq!(m.message.content(), "On it!"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_structured_message_body() {
        let event = InboundEvent::decode(
            "agent:message",
            json!({"visitorId": "v", "message": {"content": "Hello"}}),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            event,
            InboundEvent::AgentMessage(ref m) if m.message.content() == "Hello"
        ));
    }

    #[test]
    fn test_decode_unknown_and_malformed() {
        assert!(InboundEvent::decode("admin:stats", json!({})).unwrap().is_none());
        assert!(InboundEvent::decode("agent:leave", json!({"agentName": 3})).is_err());
        assert!(matches!(
            InboundEvent::decode("visitor_room_joined", Value::Null).unwrap(),
            Some(InboundEvent::VisitorRoomJoined { visitor_id: None })
        ));
    }

    #[test]
    fn test_outbound_names_and_payloads() {
        let join = OutboundEvent::JoinVisitorRoom {
            visitor_id: "visitor_a_1".into(),
        };
        assert_eq!(join.name(), "join_visitor_room");
        assert_eq!(join.payload().unwrap(), json!({"visitorId": "visitor_a_1"}));

        let status = OutboundEvent::WidgetStatus {
            visitor_id: "v".into(),
            tenant_id: "t".into(),
            is_open: true,
        };
        assert_eq!(status.name(), "widget:status");
        assert_eq!(status.payload().unwrap()["isOpen"], true);
    }
}
