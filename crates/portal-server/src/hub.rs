//! WebSocket command hub.
//!
//! The hub accepts connections on a dedicated port and dispatches them by
//! handshake request path to registered handlers:
//!
//! - a *command* callback runs once per inbound text frame and may return a
//!   reply for that client;
//! - a *loop* callback runs on the shared refresh tick, typically to
//!   broadcast periodic state.
//!
//! Inbound frames are validated (text, non-empty, newline-free), queued
//! per-connection and dispatched in arrival order. [`HubHandle::broadcast`]
//! fans a message out to every connected client.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use portal_protocol::{validate_command, CodecError};

use crate::session::STATION_REFRESH_INTERVAL;

/// At most this many concurrent clients; later connections are dropped.
pub const MAX_HUB_CLIENTS: usize = 10;

/// Per-frame command callback; a returned string is sent back to the client.
pub type CommandCallback = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Tick callback, invoked on the shared refresh cadence.
pub type LoopCallback = Arc<dyn Fn() + Send + Sync>;

/// Configuration for the command hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Cadence of the loop-style handlers.
    pub loop_interval: Duration,
    /// Per-connection command queue depth; the oldest entry is dropped on
    /// overflow.
    pub command_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".parse().unwrap(),
            loop_interval: STATION_REFRESH_INTERVAL,
            command_buffer: 16,
        }
    }
}

#[derive(Clone, Default)]
struct HubHandler {
    on_command: Option<CommandCallback>,
    on_loop: Option<LoopCallback>,
}

/// The WebSocket command hub.
pub struct CommandHub {
    config: HubConfig,
    handlers: HashMap<String, HubHandler>,
    broadcast_tx: broadcast::Sender<String>,
}

impl CommandHub {
    pub fn new(config: HubConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            config,
            handlers: HashMap::new(),
            broadcast_tx,
        }
    }

    /// Register the command callback for a handshake path.
    pub fn on_command(
        &mut self,
        path: &str,
        callback: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) {
        self.handlers.entry(path.to_string()).or_default().on_command = Some(Arc::new(callback));
    }

    /// Register the loop callback for a handshake path.
    pub fn on_loop(&mut self, path: &str, callback: impl Fn() + Send + Sync + 'static) {
        self.handlers.entry(path.to_string()).or_default().on_loop = Some(Arc::new(callback));
    }

    /// A broadcast handle, cloneable and usable from anywhere.
    pub fn handle(&self) -> HubHandle {
        HubHandle {
            tx: self.broadcast_tx.clone(),
        }
    }

    /// Run the hub, accepting WebSocket connections.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("command hub listening on {}", self.config.bind_addr);

        let handlers = Arc::new(self.handlers);
        let clients = Arc::new(AtomicUsize::new(0));

        // Shared tick for the loop-style handlers.
        {
            let handlers = handlers.clone();
            let interval = self.config.loop_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick of `interval` fires immediately; skip it so
                // handlers run on the cadence, not at startup.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    for handler in handlers.values() {
                        if let Some(callback) = &handler.on_loop {
                            callback();
                        }
                    }
                }
            });
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    if clients.load(Ordering::Acquire) >= MAX_HUB_CLIENTS {
                        warn!("rejecting {}: client limit reached", addr);
                        continue;
                    }

                    let handlers = handlers.clone();
                    let clients = clients.clone();
                    let broadcast_rx = self.broadcast_tx.subscribe();
                    let command_buffer = self.config.command_buffer;

                    tokio::spawn(async move {
                        clients.fetch_add(1, Ordering::AcqRel);
                        if let Err(e) =
                            handle_connection(stream, addr, handlers, broadcast_rx, command_buffer)
                                .await
                        {
                            error!("connection error from {}: {}", addr, e);
                        }
                        clients.fetch_sub(1, Ordering::AcqRel);
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Broadcast side of the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: broadcast::Sender<String>,
}

impl HubHandle {
    /// Send a text message to every connected client. Returns the number of
    /// clients it reached.
    pub fn broadcast(&self, message: impl Into<String>) -> usize {
        self.tx.send(message.into()).unwrap_or(0)
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handlers: Arc<HashMap<String, HubHandler>>,
    mut broadcast_rx: broadcast::Receiver<String>,
    command_buffer: usize,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Resolve the handler from the handshake request path; unknown paths
    // are rejected with a 404 during the handshake.
    let path_slot = Arc::new(std::sync::Mutex::new(String::new()));
    let path_for_cb = path_slot.clone();
    let handlers_for_cb = handlers.clone();

    let ws_stream =
        tokio_tungstenite::accept_hdr_async(stream, move |req: &Request, resp: Response| {
            let path = req.uri().path().to_string();
            if !handlers_for_cb.contains_key(&path) {
                let mut reject = ErrorResponse::new(Some("unknown command path".to_string()));
                *reject.status_mut() = StatusCode::NOT_FOUND;
                return Err(reject);
            }
            if let Ok(mut slot) = path_for_cb.lock() {
                *slot = path;
            }
            Ok(resp)
        })
        .await?;

    let path = path_slot.lock().map(|slot| slot.clone()).unwrap_or_default();
    let handler = handlers.get(&path).cloned().unwrap_or_default();
    info!("client {} attached to {}", addr, path);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Per-connection command buffer, drained in arrival order.
    let mut commands: VecDeque<String> = VecDeque::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match validate_command(&text) {
                            Ok(command) => {
                                if commands.len() == command_buffer {
                                    warn!("client {} command buffer full, dropping oldest", addr);
                                    commands.pop_front();
                                }
                                commands.push_back(command.to_string());
                            }
                            Err(e) => {
                                warn!("client {} sent an invalid frame: {}", addr, e);
                            }
                        }

                        if let Some(callback) = &handler.on_command {
                            while let Some(command) = commands.pop_front() {
                                if let Some(reply) = callback(&command) {
                                    ws_tx.send(Message::Text(reply)).await?;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("client {} dropped: {}", addr, CodecError::BinaryFrame);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_tx.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("client {} closed connection", addr);
                        break;
                    }
                    Some(Ok(_)) => {} // Pong, Frame
                    Some(Err(e)) => {
                        error!("websocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        info!("client {} disconnected", addr);
                        break;
                    }
                }
            }

            broadcasted = broadcast_rx.recv() => {
                match broadcasted {
                    Ok(message) => {
                        if ws_tx.send(Message::Text(message)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("client {} lagged {} messages", addr, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
