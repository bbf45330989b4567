//! Error types for the NxChat widget client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire NxChat client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Almost every variant is
/// recovered from inside the widget (mapped to a safe default), so callers
/// mostly see these in logs.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum NxChatError {
    /// Client storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Transport-level HTTP failure (connect, timeout, non-success status)
    #[error("HTTP error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with `success: false`
    #[error("API error: {0}")]
    Api(String),

    /// Realtime transport error (socket unavailable, handshake failure)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "socket.io"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A precondition (socket connected, visitor id available) did not hold in time
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NxChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Http error
    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an Api error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a Serialization error for the given format
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io { .. })
    }

    /// Check if this error came from the network (HTTP or socket)
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NxChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NxChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NxChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used by binaries and test helpers)
impl From<anyhow::Error> for NxChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, NxChatError>`.
pub type Result<T> = std::result::Result<T, NxChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_includes_status() {
        let err = NxChatError::http(Some(503), "service unavailable");
        assert_eq!(err.to_string(), "HTTP error (503): service unavailable");

        let err = NxChatError::http(None, "connection refused");
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn test_predicates() {
        assert!(NxChatError::transport("closed").is_network());
        assert!(NxChatError::storage("quota").is_storage());
        assert!(!NxChatError::api("nope").is_network());
    }

    #[test]
    fn test_from_serde_json() {
        let err: NxChatError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(err.is_serialization());
    }
}
