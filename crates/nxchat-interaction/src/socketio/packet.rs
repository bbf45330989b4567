//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! Only what the widget needs over the `websocket` transport: the open
//! handshake, ping/pong, namespace connect/disconnect and events. Binary
//! attachments and acks are not used by the widget protocol.

use nxchat_core::error::{NxChatError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Engine.IO packet types.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping,
    Pong,
    /// Carries a Socket.IO packet.
    Message(String),
    Upgrade,
    Noop,
}

/// Payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl OpenHandshake {
    /// How long the server may stay silent before the connection is considered dead.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// Socket.IO packet types (inside an Engine.IO message).
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Value),
    Disconnect,
    Event { name: String, payload: Value },
    Ack,
    ConnectError(Value),
}

/// Namespace connect request for the default namespace.
pub const CONNECT_DEFAULT_NAMESPACE: &str = "40";
/// Reply to a server ping.
pub const PONG: &str = "3";

fn malformed(message: impl Into<String>) -> NxChatError {
    NxChatError::serialization("socket.io", message)
}

pub fn decode_engine(frame: &str) -> Result<EnginePacket> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or_else(|| malformed("empty frame"))?;
    let rest = chars.as_str();

    match kind {
        '0' => {
            let handshake: OpenHandshake = serde_json::from_str(rest)
                .map_err(|e| malformed(format!("bad open packet: {e}")))?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => Ok(EnginePacket::Message(rest.to_string())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(malformed(format!("unknown engine.io packet type '{other}'"))),
    }
}

pub fn decode_socket(packet: &str) -> Result<SocketPacket> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or_else(|| malformed("empty socket.io packet"))?;
    let mut rest = chars.as_str();

    // optional "/namespace,"
    if rest.starts_with('/') {
        rest = match rest.find(',') {
            Some(idx) => &rest[idx + 1..],
            None => "",
        };
    }
    // optional ack id
    let data = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let json = || -> Result<Value> {
        if data.is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str(data).map_err(|e| malformed(format!("bad packet data: {e}")))
        }
    };

    match kind {
        '0' => Ok(SocketPacket::Connect(json()?)),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let mut items = match json()? {
                Value::Array(items) => items.into_iter(),
                other => return Err(malformed(format!("event data is not an array: {other}"))),
            };
            let name = match items.next() {
                Some(Value::String(name)) => name,
                _ => return Err(malformed("event without a name")),
            };
            let payload = items.next().unwrap_or(Value::Null);
            Ok(SocketPacket::Event { name, payload })
        }
        '3' => Ok(SocketPacket::Ack),
        '4' => Ok(SocketPacket::ConnectError(json()?)),
        other => Err(malformed(format!("unsupported socket.io packet type '{other}'"))),
    }
}

/// Frames an event for the default namespace: `42["name",payload]`.
pub fn encode_event(name: &str, payload: &Value) -> Result<String> {
    let body = serde_json::to_string(&serde_json::json!([name, payload]))?;
    Ok(format!("42{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let packet =
            decode_engine(r#"0{"sid":"abc","upgrades":[],"pingInterval":300,"pingTimeout":200}"#)
                .unwrap();
        match packet {
            EnginePacket::Open(open) => {
                assert_eq!(open.sid, "abc");
                assert_eq!(open.liveness_window(), Duration::from_millis(500));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_engine_control_frames() {
        assert_eq!(decode_engine("2").unwrap(), EnginePacket::Ping);
        assert_eq!(decode_engine("1").unwrap(), EnginePacket::Close);
        assert_eq!(
            decode_engine("40").unwrap(),
            EnginePacket::Message("0".to_string())
        );
        assert!(decode_engine("").is_err());
        assert!(decode_engine("9").is_err());
    }

    #[test]
    fn test_decode_event() {
        let packet =
            decode_socket(r#"2["agent:message",{"visitorId":"v","message":"hi"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                name: "agent:message".into(),
                payload: json!({"visitorId": "v", "message": "hi"}),
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = decode_socket(r#"2/widget,12["visitor_room_joined"]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                name: "visitor_room_joined".into(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn test_decode_connect_and_errors() {
        assert_eq!(
            decode_socket(r#"0{"sid":"xyz"}"#).unwrap(),
            SocketPacket::Connect(json!({"sid": "xyz"}))
        );
        assert_eq!(
            decode_socket(r#"4{"message":"Not authorized"}"#).unwrap(),
            SocketPacket::ConnectError(json!({"message": "Not authorized"}))
        );
        assert!(decode_socket(r#"2{"not":"array"}"#).is_err());
    }

    #[test]
    fn test_encode_event() {
        let frame = encode_event("join_visitor_room", &json!({"visitorId": "v"})).unwrap();
        assert_eq!(frame, r#"42["join_visitor_room",{"visitorId":"v"}]"#);
    }
}
