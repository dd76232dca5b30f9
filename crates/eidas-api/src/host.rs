//! # Static Host
//!
//! Serves the web app's build directory over plain HTTP, alongside health
//! probes and a status document:
//!
//! | Route                | Response                                   |
//! |----------------------|--------------------------------------------|
//! | `/health/liveness`   | `ok`                                       |
//! | `/health/readiness`  | `ready`                                    |
//! | `/status`            | [`StatusReport`] as JSON                   |
//! | anything else        | file under the web root, or 404            |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → count_requests → Router
//! ```

use std::net::SocketAddr;
use std::path::Path;

use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::metrics::count_requests;
use crate::server::RunningServer;
use crate::state::{StatusBoard, StatusReport};

const SERVER: &str = "http";

/// Assemble the host router for `root`.
pub fn router(root: &Path, board: StatusBoard) -> Router {
    let metrics = board.http().clone();
    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/status", get(status))
        .with_state(board);

    Router::new()
        .merge(probes)
        .fallback_service(ServeDir::new(root))
        .layer(from_fn_with_state(metrics, count_requests))
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}

async fn status(State(board): State<StatusBoard>) -> Json<StatusReport> {
    Json(board.report())
}

/// Plain HTTP server for the web app.
pub struct HttpServer {
    board: StatusBoard,
    running: Option<RunningServer>,
}

impl HttpServer {
    pub fn new(board: StatusBoard) -> Self {
        Self {
            board,
            running: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(RunningServer::addr)
    }

    /// Serve `root` on `addr`. Returns the bound address.
    pub async fn start(&mut self, addr: SocketAddr, root: &Path) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted(SERVER));
        }
        if !root.is_dir() {
            return Err(ServerError::WebRoot(root.to_path_buf()));
        }

        let listener = RunningServer::bind(SERVER, addr).await?;
        let (shutdown, _) = watch::channel(false);
        let app = router(root, self.board.clone());
        let running = RunningServer::spawn(listener, app, shutdown)?;
        let bound = running.addr();

        tracing::info!(addr = %bound, root = %root.display(), "http server listening");
        self.board.set_server(Some(bound));
        self.running = Some(running);
        Ok(bound)
    }

    /// Stop accepting, let in-flight requests finish, then clear the
    /// server so it can be started again.
    pub async fn close(&mut self) -> Result<(), ServerError> {
        let running = self.running.take().ok_or(ServerError::NotStarted(SERVER))?;
        self.board.set_server(None);
        running.stop().await?;
        tracing::info!("http server closed");
        Ok(())
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("addr", &self.local_addr())
            .finish()
    }
}
