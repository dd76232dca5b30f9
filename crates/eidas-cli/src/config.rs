//! # Configuration Loading
//!
//! Layers, lowest precedence first:
//!
//! 1. Built-in defaults ([`AppConfig::default`]).
//! 2. YAML file given with `--config`.
//! 3. Environment: `EIDAS_HTTP_PORT`, `EIDAS_WS_PORT`, `EIDAS_WEB_ROOT`,
//!    `EIDAS_SIGNER`.
//! 4. Flags on the `serve` subcommand (applied by [`crate::serve`]).

use std::path::{Path, PathBuf};

use thiserror::Error;

use eidas_api::AppConfig;

pub const ENV_HTTP_PORT: &str = "EIDAS_HTTP_PORT";
pub const ENV_WS_PORT: &str = "EIDAS_WS_PORT";
pub const ENV_WEB_ROOT: &str = "EIDAS_WEB_ROOT";
pub const ENV_SIGNER: &str = "EIDAS_SIGNER";

/// Errors raised while building the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`AppConfig`].
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// An environment override has an unusable value.
    #[error("invalid value {value:?} for {var}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Read an [`AppConfig`] from a YAML file. Missing fields take defaults.
pub fn from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is an empty mapping, not an error.
    if text.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply environment overrides read through `lookup`.
pub fn apply_env(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(ENV_HTTP_PORT) {
        config.http_port = parse_port(ENV_HTTP_PORT, value)?;
    }
    if let Some(value) = lookup(ENV_WS_PORT) {
        config.ws_port = parse_port(ENV_WS_PORT, value)?;
    }
    if let Some(value) = lookup(ENV_WEB_ROOT) {
        config.web_root = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_SIGNER) {
        config.bridge.program = PathBuf::from(value);
    }
    Ok(())
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

/// Defaults, then the optional file, then the process environment.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => AppConfig::default(),
    };
    apply_env(&mut config, |var| std::env::var(var).ok())?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
