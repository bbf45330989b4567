//! The chat widget: identity, conversation flow, message history and presence
//! for one tenant on one page load.
//!
//! # Module Structure
//!
//! - `boot`: the one-time load flow (settings, visitor upsert, session classification)
//! - `events`: socket events (agent join/leave/message, connection changes)
//! - `dispatch`: visitor messages, AI replies and agent transfers
//! - `presence`: page activity, status, typing, open/close, end chat, unload
//!
//! All conversation flags change through `ConversationState::apply`; the effects
//! it returns are carried out here after the state lock is released.

mod boot;
mod dispatch;
mod events;
mod presence;

pub use boot::PageContext;
pub use dispatch::{SendRoute, TransferResult};

use crate::alert::{AlertPlayer, NoopAlertPlayer};
use crate::readiness::ReadyGate;
use crate::watchdog::AgentResponseWatchdog;
use nxchat_core::api::{VisitorRef, WidgetApi, WidgetSettings};
use nxchat_core::config::WidgetConfig;
use nxchat_core::conversation::{ConversationState, Effect, Flow, Transition};
use nxchat_core::identity::{IdentityStore, VisitorIdentity};
use nxchat_core::message::{Message, MessageHistory, MessageType};
use nxchat_core::storage::{ClientStorage, StorageScope, keys};
use nxchat_core::transport::{ChatTransport, OutboundEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OnceCell, RwLock, broadcast};

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Something a renderer should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetUpdate {
    MessageAppended(Message),
    /// Persisted history was loaded and replaces whatever was shown.
    HistoryRestored(Vec<Message>),
    HistoryCleared,
    StateChanged(ConversationState),
}

/// Collaborators the widget drives.
#[derive(Clone)]
pub struct WidgetServices {
    pub api: Arc<dyn WidgetApi>,
    pub transport: Arc<dyn ChatTransport>,
    pub storage: Arc<dyn ClientStorage>,
    pub alerts: Arc<dyn AlertPlayer>,
}

impl WidgetServices {
    pub fn new(
        api: Arc<dyn WidgetApi>,
        transport: Arc<dyn ChatTransport>,
        storage: Arc<dyn ClientStorage>,
    ) -> Self {
        Self {
            api,
            transport,
            storage,
            alerts: Arc::new(NoopAlertPlayer),
        }
    }

    pub fn with_alert_player(mut self, alerts: Arc<dyn AlertPlayer>) -> Self {
        self.alerts = alerts;
        self
    }
}

struct WidgetInner {
    config: WidgetConfig,
    services: WidgetServices,
    identity_store: IdentityStore,
    identity: VisitorIdentity,
    state: Mutex<ConversationState>,
    history: Mutex<MessageHistory>,
    settings: RwLock<WidgetSettings>,
    watchdog: AgentResponseWatchdog,
    ready: ReadyGate,
    flow: OnceCell<Flow>,
    is_open: AtomicBool,
    updates: broadcast::Sender<WidgetUpdate>,
}

/// Handle to a widget instance. Cheap to clone.
#[derive(Clone)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

impl ChatWidget {
    /// Creates the widget and resolves the visitor identity for this load.
    pub async fn new(config: WidgetConfig, services: WidgetServices) -> Self {
        let identity_store = IdentityStore::new(services.storage.clone());
        let identity = identity_store.load(&config.tenant_id).await;
        tracing::info!(
            "[Widget] Loaded for tenant {} as {} ({})",
            config.tenant_id,
            identity.visitor_id,
            identity.session_id
        );

        let ready = ReadyGate::new();
        ready.mark_visitor_ready();
        if services.transport.is_connected() {
            ready.mark_connected();
        }

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(WidgetInner {
                config,
                services,
                identity_store,
                identity,
                state: Mutex::new(ConversationState::default()),
                history: Mutex::new(MessageHistory::new()),
                settings: RwLock::new(WidgetSettings::default()),
                watchdog: AgentResponseWatchdog::new(),
                ready,
                flow: OnceCell::new(),
                is_open: AtomicBool::new(false),
                updates,
            }),
        }
    }

    /// Subscribes to render updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetUpdate> {
        self.inner.updates.subscribe()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    pub fn identity(&self) -> &VisitorIdentity {
        &self.inner.identity
    }

    pub async fn state(&self) -> ConversationState {
        *self.inner.state.lock().await
    }

    pub async fn history(&self) -> Vec<Message> {
        self.inner.history.lock().await.messages().cloned().collect()
    }

    pub async fn settings(&self) -> WidgetSettings {
        self.inner.settings.read().await.clone()
    }

    /// The flow chosen by `boot`, if it has run.
    pub fn flow(&self) -> Option<Flow> {
        self.inner.flow.get().copied()
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open.load(Ordering::SeqCst)
    }

    /// Whether an agent-response watchdog is pending.
    pub fn is_waiting_for_agent(&self) -> bool {
        self.inner.watchdog.is_armed()
    }

    fn visitor_ref(&self) -> VisitorRef {
        VisitorRef {
            visitor_id: self.inner.identity.visitor_id.clone(),
            session_id: self.inner.identity.session_id.clone(),
            tenant_id: self.inner.config.tenant_id.clone(),
        }
    }

    fn publish(&self, update: WidgetUpdate) {
        // no subscribers is fine
        let _ = self.inner.updates.send(update);
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Applies a transition and returns its effects without running them.
    async fn transition(&self, transition: Transition) -> Vec<Effect> {
        let mut state = self.inner.state.lock().await;
        let (next, effects) = state.apply(transition.clone());
        if next != *state {
            tracing::debug!("[Widget] {:?}: {:?} -> {:?}", transition, *state, next);
            *state = next;
            drop(state);
            self.publish(WidgetUpdate::StateChanged(next));
        }
        effects
    }

    /// Applies a transition and carries out its effects.
    async fn dispatch(&self, transition: Transition) {
        let effects = self.transition(transition).await;
        self.run_effects(effects).await;
    }

    async fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadHistory => self.load_history().await,
                Effect::ShowWelcome => self.show_welcome().await,
                Effect::CheckAgentAvailability => {
                    let widget = self.clone();
                    tokio::spawn(async move {
                        widget.check_agent_availability().await;
                    });
                }
                Effect::ClearWatchdog => {
                    self.inner.watchdog.cancel();
                }
                Effect::AppendSystemMessage(text) => {
                    self.append(MessageType::System, text).await;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Message history
    // ------------------------------------------------------------------

    /// Appends a message, persists the history and notifies subscribers.
    ///
    /// Returns `false` when the message was a suppressed duplicate notice.
    async fn append(&self, message_type: MessageType, content: impl Into<String>) -> bool {
        self.append_message(Message::new(message_type, content, &self.inner.identity))
            .await
    }

    async fn append_message(&self, mut message: Message) -> bool {
        if self.is_open() {
            message.read = true;
        }

        let mut history = self.inner.history.lock().await;
        if !history.push(message.clone()) {
            tracing::debug!("[Widget] Suppressed duplicate notice: {}", message.content);
            return false;
        }
        self.persist_locked(&history).await;
        drop(history);

        self.publish(WidgetUpdate::MessageAppended(message));
        true
    }

    /// Writes the history while its lock is held so writes land in order.
    async fn persist_locked(&self, history: &MessageHistory) {
        let json = match history.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("[Widget] Failed to serialize history: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .inner
            .services
            .storage
            .set(
                StorageScope::Durable,
                &keys::history(&self.inner.config.tenant_id),
                &json,
            )
            .await
        {
            tracing::warn!("[Widget] Failed to persist history: {}", e);
        }
    }

    async fn load_history(&self) {
        let key = keys::history(&self.inner.config.tenant_id);
        let raw = match self
            .inner
            .services
            .storage
            .get(StorageScope::Durable, &key)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("[Widget] Failed to read history, starting empty: {}", e);
                None
            }
        };

        let restored = MessageHistory::restore(raw.as_deref());
        tracing::debug!("[Widget] Restored {} message(s)", restored.len());
        let snapshot: Vec<Message> = restored.messages().cloned().collect();
        *self.inner.history.lock().await = restored;
        self.publish(WidgetUpdate::HistoryRestored(snapshot));
    }

    async fn show_welcome(&self) {
        if !self.inner.history.lock().await.is_empty() {
            return;
        }
        let welcome = self.inner.settings.read().await.welcome_message.clone();
        if let Some(text) = welcome.filter(|t| !t.trim().is_empty()) {
            self.append(MessageType::Bot, text).await;
        }
    }

    async fn wipe_history(&self) {
        let mut history = self.inner.history.lock().await;
        history.clear();
        if let Err(e) = self
            .inner
            .services
            .storage
            .remove(
                StorageScope::Durable,
                &keys::history(&self.inner.config.tenant_id),
            )
            .await
        {
            tracing::warn!("[Widget] Failed to remove persisted history: {}", e);
        }
        drop(history);
        self.publish(WidgetUpdate::HistoryCleared);
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Emits a socket event if connected. Failures are logged only.
    async fn emit(&self, event: OutboundEvent) {
        let transport = &self.inner.services.transport;
        if !transport.is_connected() {
            tracing::debug!("[Widget] Socket offline, skipping '{}'", event.name());
            return;
        }
        let name = event.name();
        if let Err(e) = transport.emit(event).await {
            tracing::warn!("[Widget] Failed to emit '{}': {}", name, e);
        }
    }

    // ------------------------------------------------------------------
    // Watchdog
    // ------------------------------------------------------------------

    fn arm_watchdog(&self) {
        let widget: Weak<WidgetInner> = Arc::downgrade(&self.inner);
        self.inner
            .watchdog
            .arm(self.inner.config.watchdog_timeout, move || async move {
                if let Some(inner) = widget.upgrade() {
                    ChatWidget { inner }.on_agent_response_timeout().await;
                }
            });
    }

    async fn on_agent_response_timeout(&self) {
        tracing::info!("[Widget] No agent reply within {:?}", self.inner.config.watchdog_timeout);
        self.append(
            MessageType::System,
            nxchat_core::conversation::notices::AGENT_STILL_WAITING,
        )
        .await;
    }
}
