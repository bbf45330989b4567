//! REST contract between the widget and the backend.
//!
//! `WidgetApi` is the seam the widget talks through; the reqwest
//! implementation lives in `nxchat-interaction`. All responses share the
//! `{success, data?, message?}` envelope.

use crate::conversation::SessionStatusResult;
use crate::error::{NxChatError, Result};
use crate::message::{Message, MessageType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Response envelope used by every widget endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the envelope.
    ///
    /// # Errors
    ///
    /// `NxChatError::Api` when `success` is false or `data` is missing.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(NxChatError::api(
                self.message.unwrap_or_else(|| "request was not successful".into()),
            ));
        }
        self.data
            .ok_or_else(|| NxChatError::api("response carried no data"))
    }

    /// Checks `success` for endpoints whose data is irrelevant.
    pub fn ensure_success(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(NxChatError::api(
                self.message.unwrap_or_else(|| "request was not successful".into()),
            ))
        }
    }
}

/// Who a request is about. Flattened into most request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRef {
    pub visitor_id: String,
    pub session_id: String,
    pub tenant_id: String,
}

/// Tenant-level widget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetSettings {
    pub ai_enabled: bool,
    pub welcome_message: Option<String>,
    pub company_name: Option<String>,
    pub primary_color: Option<String>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            welcome_message: None,
            company_name: None,
            primary_color: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusRequest {
    pub visitor_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAvailability {
    pub has_online_agents: bool,
    #[serde(default)]
    pub online_agents: u32,
}

/// Visitor record upserted on every load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorProfile {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub landing_page: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// A chat message forwarded to the backend inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub tenant_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub timestamp: String,
}

impl MessageRecord {
    pub fn from_message(tenant_id: &str, message: &Message) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            visitor_id: message.visitor_id.clone(),
            session_id: message.session_id.clone(),
            content: message.content.clone(),
            message_type: message.message_type,
            timestamp: message.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReply {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    /// The text that triggered the transfer.
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferOutcome {
    pub queued: bool,
    pub agent_name: Option<String>,
}

/// A page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageActivity {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub page_url: String,
    pub page_title: Option<String>,
    pub timestamp: String,
}

/// A free-form interaction event ("chat_opened", "message_sent", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorStatus {
    Online,
    Away,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub status: VisitorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdate {
    #[serde(flatten)]
    pub visitor: VisitorRef,
    pub is_typing: bool,
}

/// The widget's REST collaborator.
///
/// Every method is one HTTP round trip. Implementations report failures as
/// errors; the widget decides which safe default each failure maps to.
#[async_trait]
pub trait WidgetApi: Send + Sync {
    /// `GET widget/settings/:tenantId`
    async fn fetch_settings(&self, tenant_id: &str) -> Result<WidgetSettings>;

    /// `POST widget/visitor/session-status`
    async fn resolve_session(&self, request: &SessionStatusRequest)
    -> Result<SessionStatusResult>;

    /// `GET widget/agent-availability/:tenantId`
    async fn agent_availability(&self, tenant_id: &str) -> Result<AgentAvailability>;

    /// `POST widget/visitor`
    async fn upsert_visitor(&self, profile: &VisitorProfile) -> Result<()>;

    /// `POST widget/visitor/message`
    async fn save_message(&self, record: &MessageRecord) -> Result<()>;

    /// `POST widget/chat/ai`
    async fn ask_ai(&self, request: &AiRequest) -> Result<AiReply>;

    /// `POST widget/visitor/request-agent`
    async fn request_agent(&self, request: &TransferRequest) -> Result<TransferOutcome>;

    /// `POST widget/visitor/activity`
    async fn track_activity(&self, activity: &PageActivity) -> Result<()>;

    /// `POST widget/visitor/activity-log`
    async fn log_activity(&self, entry: &ActivityLogEntry) -> Result<()>;

    /// `POST widget/visitor/status`
    async fn update_status(&self, update: &StatusUpdate) -> Result<()>;

    /// `POST widget/visitor/typing`
    async fn update_typing(&self, update: &TypingUpdate) -> Result<()>;

    /// `POST widget/visitor/end-chat`
    async fn end_chat(&self, visitor: &VisitorRef) -> Result<()>;
}
