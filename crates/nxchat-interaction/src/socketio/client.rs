//! Socket.IO client over tokio-tungstenite.
//!
//! One background task owns the WebSocket. The first connection is attempted
//! twice (initial try plus one retry) before the client gives up and reports
//! `connect_error`; the widget then keeps working over REST alone. Once a
//! connection has been established, drops are followed by reconnect attempts
//! every `reconnect_delay` until shutdown.

use super::packet::{
    self, CONNECT_DEFAULT_NAMESPACE, EnginePacket, PONG, SocketPacket, decode_engine,
    decode_socket,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use nxchat_core::config::WidgetConfig;
use nxchat_core::error::{NxChatError, Result};
use nxchat_core::transport::{ChatTransport, InboundEvent, OutboundEvent};
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Liveness window used until the server's open packet says otherwise.
const DEFAULT_LIVENESS: Duration = Duration::from_secs(45);

/// Why a single connection ended.
#[derive(Debug)]
enum ConnectionEnd {
    Shutdown,
    Dropped(String),
    Rejected(String),
}

/// Handle to the background Socket.IO connection.
pub struct SocketIoClient {
    outbound: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl SocketIoClient {
    /// Builds the Engine.IO WebSocket endpoint from the configured socket URL.
    ///
    /// `https://chat.acme.io` becomes
    /// `wss://chat.acme.io/socket.io/?EIO=4&transport=websocket`.
    pub fn websocket_url(socket_url: &str) -> Result<String> {
        let mut url = Url::parse(socket_url)
            .map_err(|e| NxChatError::config(format!("invalid socket_url '{socket_url}': {e}")))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(NxChatError::config(format!(
                    "unsupported socket_url scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| NxChatError::config("cannot switch socket_url to a websocket scheme"))?;
        url.set_path("/socket.io/");
        url.set_query(Some("EIO=4&transport=websocket"));
        Ok(url.to_string())
    }

    /// Starts the connection task.
    ///
    /// Returns immediately; connection progress arrives on the returned
    /// receiver as `Connected` / `ConnectError` / `Disconnected` events.
    pub fn spawn(config: &WidgetConfig) -> Result<(Self, mpsc::UnboundedReceiver<InboundEvent>)> {
        let url = Self::websocket_url(&config.socket_url)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();

        let task = ConnectionTask {
            url,
            reconnect_delay: config.reconnect_delay,
            outbound_rx,
            inbound_tx,
            connected: connected.clone(),
            shutdown: shutdown.clone(),
        };
        tokio::spawn(task.run());

        Ok((
            Self {
                outbound: outbound_tx,
                connected,
                shutdown,
            },
            inbound_rx,
        ))
    }

    /// Closes the socket and stops reconnecting.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for SocketIoClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl ChatTransport for SocketIoClient {
    async fn emit(&self, event: OutboundEvent) -> Result<()> {
        if !self.is_connected() {
            return Err(NxChatError::transport(format!(
                "cannot emit '{}': socket not connected",
                event.name()
            )));
        }
        let frame = packet::encode_event(event.name(), &event.payload()?)?;
        self.outbound
            .send(frame)
            .map_err(|_| NxChatError::transport("socket task has stopped"))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

struct ConnectionTask {
    url: String,
    reconnect_delay: Duration,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    inbound_tx: mpsc::UnboundedSender<InboundEvent>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl ConnectionTask {
    async fn run(mut self) {
        let mut ever_connected = false;
        let mut failed_attempts = 0u32;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let failure = match connect_async(self.url.as_str()).await {
                Ok((socket, _)) => {
                    tracing::debug!("[SocketIo] WebSocket open: {}", self.url);

                    let end = self.drive(socket).await;
                    // only a namespace connect counts as a successful connection
                    let reached_namespace = self.connected.swap(false, Ordering::SeqCst);
                    if reached_namespace {
                        ever_connected = true;
                        failed_attempts = 0;
                    }
                    match end {
                        ConnectionEnd::Shutdown => break,
                        ConnectionEnd::Rejected(message) => {
                            tracing::error!("[SocketIo] Namespace connect rejected: {}", message);
                            let _ = self.inbound_tx.send(InboundEvent::ConnectError { message });
                            break;
                        }
                        ConnectionEnd::Dropped(reason) if reached_namespace => {
                            tracing::warn!("[SocketIo] Disconnected: {}", reason);
                            let _ = self.inbound_tx.send(InboundEvent::Disconnected { reason });
                            None
                        }
                        ConnectionEnd::Dropped(reason) => {
                            Some(format!("handshake failed: {reason}"))
                        }
                    }
                }
                Err(e) => Some(e.to_string()),
            };

            if let Some(message) = failure {
                failed_attempts += 1;
                tracing::warn!(
                    "[SocketIo] Connection attempt {} to {} failed: {}",
                    failed_attempts,
                    self.url,
                    message
                );
                if !ever_connected && failed_attempts >= 2 {
                    let _ = self.inbound_tx.send(InboundEvent::ConnectError { message });
                    break;
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = sleep(self.reconnect_delay) => {}
            }
        }

        tracing::debug!("[SocketIo] Connection task stopped");
    }

    /// Runs one connection until it ends.
    async fn drive(&mut self, socket: Socket) -> ConnectionEnd {
        let (mut write, mut read) = socket.split();
        let mut liveness = DEFAULT_LIVENESS;
        let mut deadline = Instant::now() + liveness;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return ConnectionEnd::Shutdown;
                }
                _ = sleep_until(deadline) => {
                    return ConnectionEnd::Dropped("ping timeout".to_string());
                }
                Some(frame) = self.outbound_rx.recv() => {
                    if !self.connected.load(Ordering::SeqCst) {
                        tracing::debug!("[SocketIo] Dropping frame emitted while disconnected");
                        continue;
                    }
                    if let Err(e) = write.send(Message::Text(frame)).await {
                        return ConnectionEnd::Dropped(format!("write failed: {e}"));
                    }
                }
                incoming = read.next() => {
                    let text = match incoming {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => {
                            return ConnectionEnd::Dropped("transport close".to_string());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            return ConnectionEnd::Dropped(format!("transport error: {e}"));
                        }
                    };
                    deadline = Instant::now() + liveness;

                    let reply = match self.handle_frame(&text, &mut liveness) {
                        Ok(FrameOutcome::Continue(reply)) => reply,
                        Ok(FrameOutcome::End(end)) => return end,
                        Err(e) => {
                            tracing::warn!("[SocketIo] Ignoring malformed frame: {}", e);
                            None
                        }
                    };
                    if let Some(reply) = reply {
                        if let Err(e) = write.send(Message::Text(reply.to_string())).await {
                            return ConnectionEnd::Dropped(format!("write failed: {e}"));
                        }
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str, liveness: &mut Duration) -> Result<FrameOutcome> {
        match decode_engine(text)? {
            EnginePacket::Open(open) => {
                tracing::debug!("[SocketIo] Engine.IO session {}", open.sid);
                *liveness = open.liveness_window();
                Ok(FrameOutcome::Continue(Some(CONNECT_DEFAULT_NAMESPACE)))
            }
            EnginePacket::Ping => Ok(FrameOutcome::Continue(Some(PONG))),
            EnginePacket::Close => Ok(FrameOutcome::End(ConnectionEnd::Dropped(
                "server closed engine.io session".to_string(),
            ))),
            EnginePacket::Message(inner) => self.handle_socket_packet(&inner),
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => {
                Ok(FrameOutcome::Continue(None))
            }
        }
    }

    fn handle_socket_packet(&self, inner: &str) -> Result<FrameOutcome> {
        match decode_socket(inner)? {
            SocketPacket::Connect(_) => {
                self.connected.store(true, Ordering::SeqCst);
                tracing::info!("[SocketIo] Connected");
                let _ = self.inbound_tx.send(InboundEvent::Connected);
            }
            SocketPacket::Disconnect => {
                return Ok(FrameOutcome::End(ConnectionEnd::Dropped(
                    "io server disconnect".to_string(),
                )));
            }
            SocketPacket::ConnectError(data) => {
                let message = data
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| data.to_string());
                return Ok(FrameOutcome::End(ConnectionEnd::Rejected(message)));
            }
            SocketPacket::Event { name, payload } => match InboundEvent::decode(&name, payload)? {
                Some(event) => {
                    let _ = self.inbound_tx.send(event);
                }
                None => tracing::trace!("[SocketIo] Unhandled event '{}'", name),
            },
            SocketPacket::Ack => {}
        }
        Ok(FrameOutcome::Continue(None))
    }
}

enum FrameOutcome {
    /// Keep going, optionally replying with a frame.
    Continue(Option<&'static str>),
    End(ConnectionEnd),
}
