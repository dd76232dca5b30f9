//! # WebSocket Relay
//!
//! Connects a browser to a signer process. Every WebSocket connection is a
//! session that owns one [`ProcessBridge`]:
//!
//! ```text
//! browser ──{"id":"LINK"}──────────────▶ bridge.start()
//! browser ──{"id":"SIGN",pin,challenge}─▶ bridge.send(pin); bridge.send(challenge)
//! browser ◀──── signer stdout line, unchanged ──── bridge
//! ```
//!
//! ## Session rules
//!
//! - Inbound frames that are not a well-formed command are logged and
//!   dropped; the connection stays open.
//! - Unknown command ids are ignored.
//! - Malformed signer output ends the session with close code 1011.
//! - When the socket closes, the signer is killed if the bridge config says
//!   `kill_on_disconnect`, and left running otherwise.
//!
//! Each session runs as a single task multiplexing the socket, the bridge
//! receiver and the server shutdown signal, so the bridge has one writer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Router;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use eidas_bridge::{BridgeConfig, BridgeError, ProcessBridge};
use eidas_core::{ClientCommand, ProtocolError};
use eidas_state::RelayPhase;

use crate::error::ServerError;
use crate::metrics::RelayMetrics;
use crate::server::{stopped, RunningServer};
use crate::state::StatusBoard;

const SERVER: &str = "websocket";

// -- Router -------------------------------------------------------------------

/// Per-server state cloned into every session.
#[derive(Clone)]
struct RelayState {
    bridge: BridgeConfig,
    metrics: RelayMetrics,
    shutdown: watch::Receiver<bool>,
    next_session: Arc<AtomicU64>,
    // Held by every session; `close` waits until all clones are dropped.
    _drain: mpsc::Sender<()>,
}

fn router(state: RelayState) -> Router {
    Router::new().fallback(upgrade).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    let session = state.next_session.fetch_add(1, Ordering::Relaxed) + 1;
    ws.on_upgrade(move |socket| {
        run_session(socket, state).instrument(tracing::info_span!("session", session))
    })
}

// -- Session ------------------------------------------------------------------

async fn run_session(mut socket: WebSocket, state: RelayState) {
    let (mut bridge, mut output) = ProcessBridge::new(state.bridge.clone());
    let mut phase = RelayPhase::Idle;
    state.metrics.session_opened();
    tracing::info!("session opened");

    let close = loop {
        tokio::select! {
            _ = stopped(state.shutdown.clone()) => {
                break Some(CloseFrame {
                    code: close_code::AWAY,
                    reason: "server closing".into(),
                });
            }
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(&text, &mut bridge, &mut phase, &state.metrics).await;
                }
                Some(Ok(Message::Close(_))) | None => break None,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "socket error");
                    break None;
                }
            },
            line = output.recv() => match line {
                Some(Ok(line)) => {
                    if socket.send(Message::Text(line.into_string())).await.is_err() {
                        break None;
                    }
                    state.metrics.frame_forwarded();
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "bad signer output, ending session");
                    break Some(CloseFrame {
                        code: close_code::ERROR,
                        reason: "malformed signer output".into(),
                    });
                }
                None => break None,
            },
        }
    };

    if let Some(frame) = close {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    release(&mut bridge).await;
    state.metrics.session_closed();
    tracing::info!(phase = %phase, "session closed");
}

async fn release(bridge: &mut ProcessBridge) {
    if bridge.config().kill_on_disconnect {
        if let Err(e) = bridge.kill().await {
            tracing::warn!(error = %e, "failed to kill signer");
        }
    } else if let Some(pid) = bridge.pid() {
        tracing::warn!(pid, "leaving signer running after disconnect");
    }
}

async fn handle_frame(
    text: &str,
    bridge: &mut ProcessBridge,
    phase: &mut RelayPhase,
    metrics: &RelayMetrics,
) {
    let command = match ClientCommand::parse(text) {
        Ok(command) => command,
        Err(ProtocolError::Json(e)) => {
            // The serde message can quote field values, which may be a PIN.
            tracing::error!(
                category = ?e.classify(),
                line = e.line(),
                column = e.column(),
                "dropping malformed command"
            );
            return;
        }
    };
    metrics.command_received();

    if command == ClientCommand::Unknown {
        tracing::debug!("ignoring command with unknown id");
        return;
    }
    if !phase.expects(&command) {
        tracing::warn!(phase = %phase, id = command.id(), "command out of order");
    }
    *phase = phase.observe(&command);

    match command {
        ClientCommand::Link => match bridge.start().await {
            Ok(()) => {
                let pid = bridge.pid();
                tracing::info!(pid, "signer linked");
            }
            Err(e) => tracing::error!(error = %e, "failed to start signer"),
        },
        ClientCommand::Sign { pin, challenge } => {
            if let Err(e) = forward_sign(bridge, pin.expose(), &challenge).await {
                tracing::error!(error = %e, "failed to forward SIGN");
            }
        }
        ClientCommand::Unknown => {}
    }
}

async fn forward_sign(
    bridge: &mut ProcessBridge,
    pin: &str,
    challenge: &str,
) -> Result<(), BridgeError> {
    bridge.send(pin).await?;
    bridge.send(challenge).await?;
    tracing::debug!(challenge, "PIN and challenge sent to signer");
    Ok(())
}

// -- Server -------------------------------------------------------------------

struct Running {
    server: RunningServer,
    drain: mpsc::Receiver<()>,
}

/// WebSocket server relaying between browsers and signer processes.
pub struct WsServer {
    bridge: BridgeConfig,
    board: StatusBoard,
    next_session: Arc<AtomicU64>,
    running: Option<Running>,
}

impl WsServer {
    pub fn new(bridge: BridgeConfig, board: StatusBoard) -> Self {
        Self {
            bridge,
            board,
            next_session: Arc::new(AtomicU64::new(0)),
            running: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.server.addr())
    }

    /// Listen on `addr`. Returns the bound address.
    pub async fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted(SERVER));
        }

        let listener = RunningServer::bind(SERVER, addr).await?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (drain_tx, drain) = mpsc::channel(1);
        let app = router(RelayState {
            bridge: self.bridge.clone(),
            metrics: self.board.relay().clone(),
            shutdown: shutdown_rx,
            next_session: Arc::clone(&self.next_session),
            _drain: drain_tx,
        });
        let server = RunningServer::spawn(listener, app, shutdown)?;
        let bound = server.addr();

        tracing::info!(addr = %bound, program = %self.bridge.program.display(), "websocket server listening");
        self.board.set_socket(Some(bound));
        self.running = Some(Running { server, drain });
        Ok(bound)
    }

    /// Stop listening and close every open session with code 1001.
    ///
    /// Returns once all sessions have ended and released their signers.
    pub async fn close(&mut self) -> Result<(), ServerError> {
        let Running { server, mut drain } =
            self.running.take().ok_or(ServerError::NotStarted(SERVER))?;
        self.board.set_socket(None);
        server.stop().await?;
        // Resolves with `None` once every session has dropped its sender.
        let _ = drain.recv().await;
        tracing::info!("websocket server closed");
        Ok(())
    }
}

impl std::fmt::Debug for WsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsServer")
            .field("program", &self.bridge.program)
            .field("addr", &self.local_addr())
            .finish()
    }
}
