//! The one-time load flow.

use super::ChatWidget;
use nxchat_core::api::{SessionStatusRequest, VisitorProfile};
use nxchat_core::conversation::{Flow, SessionStatusResult, Transition};
use nxchat_core::storage::{StorageScope, keys};

/// What the host page knows about the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub url: String,
    pub title: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl ChatWidget {
    /// Runs the load flow and returns the flow that was chosen.
    ///
    /// The session is classified at most once per widget instance; later calls
    /// return the first result without contacting the backend again.
    pub async fn boot(&self, page: &PageContext) -> Flow {
        *self
            .inner
            .flow
            .get_or_init(|| self.run_load_flow(page))
            .await
    }

    async fn run_load_flow(&self, page: &PageContext) -> Flow {
        self.load_settings().await;

        let landing_page = self.remember_landing_page(&page.url).await;
        self.upsert_visitor(page, landing_page).await;

        if !self.inner.ready.wait(self.inner.config.ready_timeout).await {
            tracing::warn!(
                "[Widget] Socket not ready ({:?}), continuing over REST",
                self.inner.ready.current()
            );
        }

        let status = self.resolve_session().await;
        let flow = Flow::classify(&status);
        tracing::info!(
            "[Widget] Session classified as {:?} (assigned agent: {:?})",
            flow,
            status.assigned_agent_id
        );

        self.dispatch(Transition::Enter(flow)).await;
        self.track_page_view(&page.url, page.title.as_deref()).await;
        flow
    }

    async fn load_settings(&self) {
        let tenant_id = &self.inner.config.tenant_id;
        match self.inner.services.api.fetch_settings(tenant_id).await {
            Ok(settings) => {
                tracing::debug!(
                    "[Widget] Settings loaded (ai_enabled: {})",
                    settings.ai_enabled
                );
                *self.inner.settings.write().await = settings;
            }
            Err(e) => tracing::warn!("[Widget] Failed to load settings, using defaults: {}", e),
        }
    }

    /// Stores the first page of this tab; later pages keep the original.
    async fn remember_landing_page(&self, url: &str) -> Option<String> {
        let storage = &self.inner.services.storage;
        let key = keys::landing_page(&self.inner.config.tenant_id);

        match storage.get(StorageScope::Tab, &key).await {
            Ok(Some(existing)) => Some(existing),
            Ok(None) if url.is_empty() => None,
            Ok(None) => {
                if let Err(e) = storage.set(StorageScope::Tab, &key, url).await {
                    tracing::debug!("[Widget] Failed to store landing page: {}", e);
                }
                Some(url.to_string())
            }
            Err(e) => {
                tracing::debug!("[Widget] Failed to read landing page: {}", e);
                (!url.is_empty()).then(|| url.to_string())
            }
        }
    }

    async fn upsert_visitor(&self, page: &PageContext, landing_page: Option<String>) {
        let profile = VisitorProfile {
            visitor: self.visitor_ref(),
            landing_page,
            referrer: page.referrer.clone(),
            user_agent: page.user_agent.clone(),
        };
        if let Err(e) = self.inner.services.api.upsert_visitor(&profile).await {
            tracing::warn!("[Widget] Failed to register visitor: {}", e);
        }
    }

    /// One attempt; any failure means "new visitor".
    async fn resolve_session(&self) -> SessionStatusResult {
        let request = SessionStatusRequest {
            visitor_id: self.inner.identity.visitor_id.clone(),
            tenant_id: self.inner.config.tenant_id.clone(),
        };
        match self.inner.services.api.resolve_session(&request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    "[Widget] Session status unavailable, treating visitor as new: {}",
                    e
                );
                SessionStatusResult::new_visitor()
            }
        }
    }
}
