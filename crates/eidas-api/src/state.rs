//! # Application State
//!
//! [`AppContext`] is built once at startup from an [`AppConfig`] and owns
//! both servers. There are no process-wide singletons: everything a server
//! needs is handed to it here.
//!
//! [`StatusBoard`] is the only state the two servers share. The relay
//! records its address and session counters on it; the host reports them
//! at `GET /status`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use eidas_bridge::BridgeConfig;

use crate::error::ServerError;
use crate::host::HttpServer;
use crate::metrics::{HttpMetrics, RelayMetrics};
use crate::relay::WsServer;

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_WS_PORT: u16 = 8081;
pub const DEFAULT_WEB_ROOT: &str = "web";

// -- Configuration ------------------------------------------------------------

/// Application configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interface both servers listen on.
    pub bind: IpAddr,
    /// Static host port.
    pub http_port: u16,
    /// Relay port.
    pub ws_port: u16,
    /// Directory served by the static host.
    pub web_root: PathBuf,
    /// Signer launch settings, one process per relay session.
    pub bridge: BridgeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: DEFAULT_HTTP_PORT,
            ws_port: DEFAULT_WS_PORT,
            web_root: PathBuf::from(DEFAULT_WEB_ROOT),
            bridge: BridgeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.http_port)
    }

    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.ws_port)
    }
}

// -- Status -------------------------------------------------------------------

/// Addresses the servers are bound to, when started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub server: Option<SocketAddr>,
    pub socket: Option<SocketAddr>,
}

impl Endpoints {
    /// `http://…` URL of the static host.
    pub fn server_url(&self) -> Option<String> {
        self.server.map(|addr| format!("http://{addr}"))
    }

    /// `ws://…` URL of the relay.
    pub fn socket_url(&self) -> Option<String> {
        self.socket.map(|addr| format!("ws://{addr}"))
    }
}

/// Session counters in a [`StatusReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounts {
    pub opened: u64,
    pub active: u64,
}

/// Static host counters in a [`StatusReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCounts {
    pub requests: u64,
    pub errors: u64,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub server: Option<String>,
    pub socket: Option<String>,
    pub sessions: SessionCounts,
    pub frames_forwarded: u64,
    pub commands_received: u64,
    pub http: HttpCounts,
}

/// State shared between the host and the relay.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    endpoints: Arc<RwLock<Endpoints>>,
    relay: RelayMetrics,
    http: HttpMetrics,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> Endpoints {
        *self.endpoints.read()
    }

    pub fn relay(&self) -> &RelayMetrics {
        &self.relay
    }

    pub fn http(&self) -> &HttpMetrics {
        &self.http
    }

    pub(crate) fn set_server(&self, addr: Option<SocketAddr>) {
        self.endpoints.write().server = addr;
    }

    pub(crate) fn set_socket(&self, addr: Option<SocketAddr>) {
        self.endpoints.write().socket = addr;
    }

    pub fn report(&self) -> StatusReport {
        let endpoints = self.endpoints();
        StatusReport {
            server: endpoints.server_url(),
            socket: endpoints.socket_url(),
            sessions: SessionCounts {
                opened: self.relay.sessions_opened(),
                active: self.relay.sessions_active(),
            },
            frames_forwarded: self.relay.frames_forwarded(),
            commands_received: self.relay.commands_received(),
            http: HttpCounts {
                requests: self.http.requests(),
                errors: self.http.errors(),
            },
        }
    }
}

// -- Context ------------------------------------------------------------------

/// Owner of the static host and the relay.
pub struct AppContext {
    config: AppConfig,
    board: StatusBoard,
    http: HttpServer,
    ws: WsServer,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let board = StatusBoard::new();
        let http = HttpServer::new(board.clone());
        let ws = WsServer::new(config.bridge.clone(), board.clone());
        Self {
            config,
            board,
            http,
            ws,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Start the host, then the relay. If the relay fails to start the
    /// host is closed again.
    pub async fn start_all(&mut self) -> Result<Endpoints, ServerError> {
        self.http
            .start(self.config.http_addr(), &self.config.web_root)
            .await?;
        if let Err(e) = self.ws.start(self.config.ws_addr()).await {
            if let Err(close_err) = self.http.close().await {
                tracing::warn!(error = %close_err, "failed to close http server after relay start failure");
            }
            return Err(e);
        }
        Ok(self.board.endpoints())
    }

    /// Close both servers. Both are attempted; the first error is returned.
    pub async fn close_all(&mut self) -> Result<(), ServerError> {
        let ws = self.ws.close().await;
        let http = self.http.close().await;
        ws.and(http)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("endpoints", &self.board.endpoints())
            .finish()
    }
}
