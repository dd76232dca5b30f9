//! # eidas-cli — Command-Line Tools for the eIDAS Bridge
//!
//! ## Binaries
//!
//! - `eidas-bridge serve` — static web app on 8080 and signer relay on 8081
//!   until Ctrl-C.
//! - `eidas-bridge link` — run the verification flow against a relay from
//!   a terminal and print the contract calldata.
//! - `mock-signer` — development stand-in for the signer binary.
//!
//! ```bash
//! eidas-bridge -v serve --web-root web/dist --signer ./bridge
//! eidas-bridge link --address 0x71C7656EC7ab88b098defB751B7401B5f6d8976F
//! ```

pub mod config;
pub mod link;
pub mod mock;
pub mod serve;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (the count of `-v`
/// flags) selects `info`, `debug` or `trace`, and zero selects `default`.
pub fn init_tracing(verbosity: u8, json: bool, default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => default,
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
