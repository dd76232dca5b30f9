//! # Server Errors
//!
//! Lifecycle errors of the HTTP host and the WebSocket relay. Starting a
//! started server or closing a stopped one is a caller bug and is reported,
//! never ignored.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when starting or closing a server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// `start` was called on a running server.
    #[error("{0} server is already started")]
    AlreadyStarted(&'static str),

    /// `close` was called on a stopped server.
    #[error("{0} server is not started")]
    NotStarted(&'static str),

    /// The listening socket could not be bound.
    #[error("failed to bind {server} server to {addr}: {source}")]
    Bind {
        /// `"http"` or `"websocket"`.
        server: &'static str,
        /// Requested address.
        addr: SocketAddr,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The static root is not a directory.
    #[error("web root {0} is not a directory")]
    WebRoot(PathBuf),

    /// The accept loop failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Task(String),
}
