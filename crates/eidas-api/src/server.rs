//! Listener plumbing shared by the HTTP host and the WebSocket relay.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ServerError;

/// Resolves once `rx` reads `true` or its sender is gone.
pub(crate) async fn stopped(mut rx: watch::Receiver<bool>) {
    loop {
        let stop = *rx.borrow_and_update();
        if stop || rx.changed().await.is_err() {
            return;
        }
    }
}

/// A serving listener and the means to stop it.
pub(crate) struct RunningServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub(crate) async fn bind(
        server: &'static str,
        addr: SocketAddr,
    ) -> Result<TcpListener, ServerError> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                server,
                addr,
                source,
            })
    }

    /// Serve `router` on `listener` until `shutdown` is set.
    pub(crate) fn spawn(
        listener: TcpListener,
        router: Router,
        shutdown: watch::Sender<bool>,
    ) -> Result<Self, ServerError> {
        let addr = listener.local_addr()?;
        let signal = stopped(shutdown.subscribe());
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });
        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and wait for the accept loop to drain.
    pub(crate) async fn stop(self) -> Result<(), ServerError> {
        // Fails only when every receiver is gone, i.e. the loop already ended.
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| ServerError::Task(e.to_string()))??;
        Ok(())
    }
}
