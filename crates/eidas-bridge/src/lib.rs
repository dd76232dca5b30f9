//! # eidas-bridge — Signer Process Bridge
//!
//! Owns at most one child process running the signer binary and exposes it
//! as a line protocol:
//!
//! ```text
//!   send("1234") ──▶ stdin  "1234\n"
//!                    stdout "{\"id\":\"INSERTED\"}\n" ──▶ BridgeReceiver
//!                    stderr "opening reader…\n"       ──▶ tracing (debug)
//! ```
//!
//! ## Single consumer
//!
//! [`ProcessBridge::new`] returns the bridge together with its
//! [`BridgeReceiver`]. There is exactly one receiver per bridge, so exactly
//! one consumer sees each output line.
//!
//! ## Generations
//!
//! Every `start()` begins a new process generation. Output still queued
//! from an earlier generation is discarded by the receiver, so a restart
//! never leaks lines from the process it replaced.

pub mod config;
pub mod error;
pub mod process;

pub use config::{BridgeConfig, OutputMode};
pub use error::BridgeError;
pub use process::{BridgeReceiver, ProcessBridge, SignerLine};
