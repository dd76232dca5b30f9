//! # eidas-api — Servers for the eIDAS Bridge
//!
//! Two loopback servers run side by side on the desktop:
//!
//! | Port (default) | Module      | Role                                        |
//! |----------------|-------------|---------------------------------------------|
//! | 8080           | [`host`]    | Static web app, health probes, `/status`    |
//! | 8081           | [`relay`]   | WebSocket relay between browser and signer  |
//!
//! Both follow the same lifecycle: `start(addr)` fails with
//! [`ServerError::AlreadyStarted`] when running, `close()` fails with
//! [`ServerError::NotStarted`] when stopped, and a closed server can be
//! started again.
//!
//! [`AppContext`] owns both and is the only entry point the binary needs.

pub mod error;
pub mod host;
pub mod metrics;
pub mod relay;
mod server;
pub mod state;

pub use error::ServerError;
pub use host::HttpServer;
pub use metrics::{HttpMetrics, RelayMetrics};
pub use relay::WsServer;
pub use state::{AppConfig, AppContext, Endpoints, HttpCounts, StatusBoard, StatusReport};
