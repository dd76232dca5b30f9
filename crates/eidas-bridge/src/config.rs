//! # Bridge Configuration
//!
//! Deserialised from the `bridge:` section of the application config file.
//! Every field has a default, so an empty section is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default signer binary, relative to the working directory.
pub const DEFAULT_PROGRAM: &str = "./bridge";

/// How stdout lines are decoded before delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every line must be one JSON value; others are reported as malformed.
    #[default]
    Json,
    /// Lines are delivered as text without validation.
    Raw,
}

/// How to launch and supervise the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Signer executable.
    pub program: PathBuf,
    /// Fixed arguments, e.g. `["-opensc", "/usr/lib/opensc-pkcs11.so"]`.
    pub args: Vec<String>,
    /// Working directory of the child. Inherited when unset.
    pub working_dir: Option<PathBuf>,
    /// Stdout decoding.
    pub output: OutputMode,
    /// Kill the signer when its WebSocket session ends.
    pub kill_on_disconnect: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            args: Vec::new(),
            working_dir: None,
            output: OutputMode::Json,
            kill_on_disconnect: true,
        }
    }
}

impl BridgeConfig {
    /// Defaults with a different program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_kill_on_disconnect(mut self, kill: bool) -> Self {
        self.kill_on_disconnect = kill;
        self
    }
}
