//! # Serve Subcommand
//!
//! Runs the static host and the WebSocket relay until Ctrl-C, then closes
//! both. The server and socket URLs are printed on startup.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use eidas_api::{AppConfig, AppContext};

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Interface to listen on.
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Port of the static web app.
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Port of the WebSocket relay.
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Directory holding the built web app.
    #[arg(long, value_name = "DIR")]
    pub web_root: Option<PathBuf>,

    /// Signer binary to launch for each session.
    #[arg(long, value_name = "PATH")]
    pub signer: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply flag overrides on top of file and environment settings.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(port) = self.ws_port {
            config.ws_port = port;
        }
        if let Some(root) = &self.web_root {
            config.web_root = root.clone();
        }
        if let Some(signer) = &self.signer {
            config.bridge.program = signer.clone();
        }
    }
}

/// Execute the serve subcommand.
pub async fn run_serve(args: &ServeArgs, mut config: AppConfig) -> Result<u8> {
    args.apply(&mut config);

    let mut context = AppContext::new(config);
    tracing::info!(
        signer = %context.config().bridge.program.display(),
        web_root = %context.config().web_root.display(),
        kill_on_disconnect = context.config().bridge.kill_on_disconnect,
        "starting servers"
    );
    let endpoints = context
        .start_all()
        .await
        .context("failed to start servers")?;

    if let Some(url) = endpoints.server_url() {
        println!("Server: {url}");
    }
    if let Some(url) = endpoints.socket_url() {
        println!("Socket: {url}");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("shutdown requested");

    context
        .close_all()
        .await
        .context("failed to close servers")?;

    let report = context.board().report();
    tracing::info!(
        sessions = report.sessions.opened,
        frames_forwarded = report.frames_forwarded,
        http_requests = report.http.requests,
        "servers closed"
    );
    Ok(0)
}
