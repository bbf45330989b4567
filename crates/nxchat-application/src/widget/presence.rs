//! Presence, activity and conversation lifecycle.

use super::ChatWidget;
use nxchat_core::api::{ActivityLogEntry, PageActivity, StatusUpdate, TypingUpdate, VisitorStatus};
use nxchat_core::conversation::Transition;
use nxchat_core::transport::OutboundEvent;
use serde_json::Value;
use std::sync::atomic::Ordering;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl ChatWidget {
    /// Records a page view.
    pub async fn track_page_view(&self, url: &str, title: Option<&str>) {
        if url.is_empty() {
            return;
        }
        let activity = PageActivity {
            visitor: self.visitor_ref(),
            page_url: url.to_string(),
            page_title: title.map(str::to_string),
            timestamp: now(),
        };
        if let Err(e) = self.inner.services.api.track_activity(&activity).await {
            tracing::debug!("[Widget] Failed to record page view: {}", e);
        }
        self.emit(OutboundEvent::VisitorActivity(activity)).await;
    }

    /// Records an interaction ("chat_opened", "message_sent", ...).
    pub async fn log_activity(&self, action: &str, details: Value) {
        let entry = ActivityLogEntry {
            visitor: self.visitor_ref(),
            action: action.to_string(),
            details,
            timestamp: now(),
        };
        if let Err(e) = self.inner.services.api.log_activity(&entry).await {
            tracing::debug!("[Widget] Failed to log activity '{}': {}", action, e);
        }
    }

    pub async fn set_status(&self, status: VisitorStatus) {
        let update = StatusUpdate {
            visitor: self.visitor_ref(),
            status,
        };
        if let Err(e) = self.inner.services.api.update_status(&update).await {
            tracing::debug!("[Widget] Failed to update status: {}", e);
        }
        self.emit(OutboundEvent::VisitorStatus(update)).await;
    }

    pub async fn set_typing(&self, is_typing: bool) {
        let update = TypingUpdate {
            visitor: self.visitor_ref(),
            is_typing,
        };
        if let Err(e) = self.inner.services.api.update_typing(&update).await {
            tracing::debug!("[Widget] Failed to update typing indicator: {}", e);
        }
        self.emit(OutboundEvent::VisitorTyping(update)).await;
    }

    /// Opens or closes the chat window. Opening marks every message read.
    pub async fn set_open(&self, open: bool) {
        let was_open = self.inner.is_open.swap(open, Ordering::SeqCst);
        if was_open == open {
            return;
        }

        if open {
            let mut history = self.inner.history.lock().await;
            if history.mark_all_read() > 0 {
                self.persist_locked(&history).await;
            }
        }

        self.emit(OutboundEvent::WidgetStatus {
            visitor_id: self.inner.identity.visitor_id.clone(),
            tenant_id: self.inner.config.tenant_id.clone(),
            is_open: open,
        })
        .await;
        self.log_activity(
            if open { "chat_opened" } else { "chat_closed" },
            Value::Null,
        )
        .await;
    }

    /// Unread agent and bot replies.
    pub async fn unread_count(&self) -> usize {
        self.inner.history.lock().await.unread_count()
    }

    /// Ends the conversation on the backend and starts over locally.
    pub async fn end_chat(&self) {
        if let Err(e) = self.inner.services.api.end_chat(&self.visitor_ref()).await {
            tracing::warn!("[Widget] Failed to end chat on the server: {}", e);
        }
        self.dispatch(Transition::ChatEnded).await;
        self.wipe_history().await;
        tracing::info!("[Widget] Chat ended");
    }

    /// Clears the local history without touching the conversation.
    pub async fn clear_history(&self) {
        self.wipe_history().await;
    }

    /// Page teardown: goes offline and forgets this load's session id.
    pub async fn unload(&self) {
        self.inner.watchdog.cancel();
        self.set_status(VisitorStatus::Offline).await;
        self.inner
            .identity_store
            .release_session(&self.inner.config.tenant_id)
            .await;
        tracing::debug!("[Widget] Unloaded");
    }
}
