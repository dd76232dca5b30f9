//! # Bridge Errors

use thiserror::Error;

/// Errors raised by the process bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// `send` was called with no signer process running.
    #[error("signer is not running")]
    NotRunning,

    /// The signer binary could not be launched.
    #[error("failed to spawn signer {program}: {source}")]
    Spawn {
        /// Program path as configured.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A standard stream of the child was not captured.
    #[error("signer {0} was not captured")]
    StdioUnavailable(&'static str),

    /// Reading from or writing to the signer failed.
    #[error("signer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stdout line was not a JSON value.
    #[error("malformed signer output {line:?}: {source}")]
    MalformedOutput {
        /// The offending line, without its newline.
        line: String,
        /// Parser error.
        source: serde_json::Error,
    },
}
