//! # eidas-core — Foundational Types for the eIDAS Bridge
//!
//! Defines the values that cross the two process boundaries of the bridge:
//! the browser ⇄ desktop WebSocket protocol and the desktop ⇄ signer
//! line protocol. Every other crate in the workspace depends on
//! `eidas-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for secrets and identifiers.** `Pin` is zeroized on drop and
//!    never printed. `Challenge` and `TxHash` have validated constructors.
//!
//! 2. **Opaque forwarding, typed inspection.** The relay forwards signer
//!    lines byte-for-byte. Typed views (`SignerMessage`) are only built by
//!    consumers that need to act on a message.
//!
//! 3. **Lossless proof numbers.** The signer emits 254-bit field elements as
//!    bare JSON integers. They are captured from the raw token and parsed
//!    into `BigUint`, never routed through `f64`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `eidas-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod proof;
pub mod protocol;

pub use error::{ProofError, ProtocolError, ValidationError};
pub use identity::{Challenge, Pin, TxHash, CHALLENGE_HEX_LEN};
pub use proof::{FieldElement, Groth16Proof, VerificationCalldata, PROOF_INPUT_LEN};
pub use protocol::{ClientCommand, SignerMessage};
