//! reqwest implementation of `WidgetApi`.

use async_trait::async_trait;
use nxchat_core::api::{
    ActivityLogEntry, AgentAvailability, AiReply, AiRequest, ApiResponse, MessageRecord,
    PageActivity, SessionStatusRequest, StatusUpdate, TransferOutcome, TransferRequest,
    TypingUpdate, VisitorProfile, VisitorRef, WidgetApi, WidgetSettings,
};
use nxchat_core::config::WidgetConfig;
use nxchat_core::conversation::SessionStatusResult;
use nxchat_core::error::{NxChatError, Result};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Talks to the widget REST endpoints under `api_base_url`.
#[derive(Clone)]
pub struct HttpWidgetApi {
    client: Client,
    base_url: String,
}

impl HttpWidgetApi {
    pub fn new(config: &WidgetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NxChatError::http(None, format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await.map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NxChatError::http(Some(status.as_u16()), body));
        }

        response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| NxChatError::serialization("json", format!("bad response body: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        let url = self.url(path);
        tracing::debug!("[HttpWidgetApi] GET {}", url);
        self.send(self.client.get(&url)).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("[HttpWidgetApi] POST {}", url);
        self.send(self.client.post(&url).json(body)).await
    }

    /// POST whose response data is ignored.
    async fn post_ack<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.post::<B, serde_json::Value>(path, body)
            .await?
            .ensure_success()
    }
}

fn map_reqwest(error: reqwest::Error) -> NxChatError {
    let status = error.status().map(|s| s.as_u16());
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    };
    NxChatError::http(status, message)
}

#[async_trait]
impl WidgetApi for HttpWidgetApi {
    async fn fetch_settings(&self, tenant_id: &str) -> Result<WidgetSettings> {
        self.get(&format!("widget/settings/{tenant_id}"))
            .await?
            .into_data()
    }

    async fn resolve_session(&self, request: &SessionStatusRequest) -> Result<SessionStatusResult> {
        self.post("widget/visitor/session-status", request)
            .await?
            .into_data()
    }

    async fn agent_availability(&self, tenant_id: &str) -> Result<AgentAvailability> {
        self.get(&format!("widget/agent-availability/{tenant_id}"))
            .await?
            .into_data()
    }

    async fn upsert_visitor(&self, profile: &VisitorProfile) -> Result<()> {
        self.post_ack("widget/visitor", profile).await
    }

    async fn save_message(&self, record: &MessageRecord) -> Result<()> {
        self.post_ack("widget/visitor/message", record).await
    }

    async fn ask_ai(&self, request: &AiRequest) -> Result<AiReply> {
        self.post("widget/chat/ai", request).await?.into_data()
    }

    async fn request_agent(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let response: ApiResponse<TransferOutcome> =
            self.post("widget/visitor/request-agent", request).await?;
        if !response.success {
            return Err(NxChatError::api(
                response
                    .message
                    .unwrap_or_else(|| "transfer request was rejected".into()),
            ));
        }
        Ok(response.data.unwrap_or_default())
    }

    async fn track_activity(&self, activity: &PageActivity) -> Result<()> {
        self.post_ack("widget/visitor/activity", activity).await
    }

    async fn log_activity(&self, entry: &ActivityLogEntry) -> Result<()> {
        self.post_ack("widget/visitor/activity-log", entry).await
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<()> {
        self.post_ack("widget/visitor/status", update).await
    }

    async fn update_typing(&self, update: &TypingUpdate) -> Result<()> {
        self.post_ack("widget/visitor/typing", update).await
    }

    async fn end_chat(&self, visitor: &VisitorRef) -> Result<()> {
        self.post_ack("widget/visitor/end-chat", visitor).await
    }
}
