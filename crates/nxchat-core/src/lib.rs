//! Domain layer of the NxChat widget client.
//!
//! Holds the visitor identity, the conversation state machine, the message
//! history and the contracts (`WidgetApi`, `ChatTransport`, `ClientStorage`)
//! the application layer drives. Nothing here performs I/O directly.

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod message;
pub mod storage;
pub mod transfer;
pub mod transport;

// Re-export common error type
pub use error::NxChatError;
