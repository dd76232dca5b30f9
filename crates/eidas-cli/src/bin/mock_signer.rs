//! # mock-signer entry point
//!
//! Plays the signer side of the line protocol on stdin/stdout. Logs go to
//! stderr so they never mix with protocol output.

use std::process::ExitCode;

use clap::Parser;

use eidas_cli::mock::{run_mock, MockArgs};

/// Development stand-in for the eIDAS signer binary.
#[derive(Parser, Debug)]
#[command(name = "mock-signer", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: MockArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    eidas_cli::init_tracing(cli.verbose, false, "warn");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match run_mock(&cli.args, stdin.lock(), stdout.lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
