//! # eidas-state — State Machines for the eIDAS Bridge
//!
//! ## State Machines
//!
//! - **Machine** (`machine.rs`): generic table-driven interpreter. A static
//!   transition table maps `(state, event id)` to a target state and a list
//!   of actions that mutate the machine's context.
//!
//! - **Verification** (`verification.rs`): the user journey
//!   `display → insertCard → enterPin → signing → generatingProof → verify →
//!   verifying → display`, plus the `revoking` branch, expressed as a table
//!   for [`Machine`].
//!
//! - **Relay phase** (`relay.rs`): `Idle → Linked → Signed`, observed per
//!   WebSocket connection for logging.
//!
//! ## Design
//!
//! Events are sum types whose variants carry their payload, and the context
//! is a fixed struct, so an action can only read fields its event actually
//! has. Unknown transitions always return [`MachineError`]: they are
//! invariant violations, not expected runtime conditions.

pub mod machine;
pub mod relay;
pub mod verification;

pub use machine::{Machine, MachineConfig, MachineError, MachineEvent, Transition, TransitionRecord};

pub use verification::{
    verification_machine, VerificationContext, VerificationEvent, VerificationEventId,
    VerificationMachine, VerificationState,
};

pub use relay::RelayPhase;
