//! # eidas-bridge CLI entry point
//!
//! Parses command-line arguments, loads configuration and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use eidas_cli::link::{run_link, LinkArgs};
use eidas_cli::serve::{run_serve, ServeArgs};

/// Desktop bridge between a web app and an eIDAS identity card signer.
#[derive(Parser, Debug)]
#[command(name = "eidas-bridge", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the web app and the signer relay until Ctrl-C.
    Serve(ServeArgs),

    /// Run the verification flow against a relay and print the calldata.
    Link(LinkArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        Commands::Link(_) => "warn",
    };
    eidas_cli::init_tracing(cli.verbose, cli.log_json, default_level);

    tracing::debug!("eidas-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    let result = run(cli);

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match cli.command {
            Commands::Serve(args) => {
                let config = eidas_cli::config::load(cli.config.as_deref())?;
                run_serve(&args, config).await
            }
            Commands::Link(args) => run_link(&args).await,
        }
    })
}
