//! # Identity Verification Flow
//!
//! Sequences the user journey from linking an identity card to a verified
//! on-chain identity.
//!
//! ## States
//!
//! ```text
//! display ──LINK──▶ insertCard ──INSERTED──▶ enterPin ──ENTERED──▶ signing
//!    ▲                                                                │
//!    │                                                             SIGNED
//!    │                                                                ▼
//! verifying ◀──VERIFY── verify ◀──────────GENERATED────────── generatingProof
//!    │
//!    └──VERIFIED──▶ display ──REVOKE──▶ revoking ──REVOKED──▶ display
//! ```
//!
//! `INSERTED`, `SIGNED` and `GENERATED` come from the signer via the relay;
//! `LINK` and `ENTERED` come from the user; `VERIFY`/`VERIFIED` and
//! `REVOKE`/`REVOKED` bracket the wallet's contract transactions.
//!
//! ## Context
//!
//! The PIN is held only between `ENTERED` and `SIGNED`. The proof is kept
//! from `GENERATED` on so it can be submitted; the transaction hash is
//! recorded when a contract call is sent.

use serde::{Deserialize, Serialize};

use eidas_core::{Groth16Proof, Pin, SignerMessage, TxHash};

use crate::machine::{Machine, MachineConfig, MachineEvent, Transition};

/// Banner shown on the identity card once the contract reports it verified.
pub const VERIFIED_UPPER_TEXT: &str = "Verified by European Union";

/// A step of the verification journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationState {
    /// Idle; shows the identity (verified or not).
    Display,
    /// A revoke transaction is pending.
    Revoking,
    /// Waiting for the identity card.
    InsertCard,
    /// Waiting for the user's PIN.
    EnterPin,
    /// The card is signing the challenge.
    Signing,
    /// The signer is generating the proof.
    GeneratingProof,
    /// A proof is ready to submit.
    Verify,
    /// The verification transaction is pending.
    Verifying,
}

impl VerificationState {
    /// Every state, in journey order.
    pub const ALL: [VerificationState; 8] = [
        Self::Display,
        Self::Revoking,
        Self::InsertCard,
        Self::EnterPin,
        Self::Signing,
        Self::GeneratingProof,
        Self::Verify,
        Self::Verifying,
    ];

    /// Whether the state waits on work outside the user's control.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Revoking | Self::Signing | Self::GeneratingProof | Self::Verifying
        )
    }

    /// Headline and explanation shown to the user in this state.
    pub fn status_text(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Display | Self::Verify => None,
            Self::Revoking => Some(("Revoking identity", "Revoking identity for demo purposes")),
            Self::InsertCard => Some((
                "Insert your card",
                "Please insert your identity card to computer",
            )),
            Self::EnterPin => Some(("Enter your PIN", "Enter your qualified signature PIN")),
            Self::Signing => Some(("Signing", "Your card is signing the challenge")),
            Self::GeneratingProof => Some((
                "Generating proof",
                "Proving your signature without revealing it",
            )),
            Self::Verifying => Some((
                "Verifying proof",
                "Waiting for on-chain transaction to go through",
            )),
        }
    }
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Display => "display",
            Self::Revoking => "revoking",
            Self::InsertCard => "insertCard",
            Self::EnterPin => "enterPin",
            Self::Signing => "signing",
            Self::GeneratingProof => "generatingProof",
            Self::Verify => "verify",
            Self::Verifying => "verifying",
        };
        f.write_str(s)
    }
}

/// Discriminator of a [`VerificationEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationEventId {
    Link,
    Inserted,
    Entered,
    Signed,
    Generated,
    Verify,
    Verified,
    Revoke,
    Revoked,
}

impl VerificationEventId {
    /// Every event id.
    pub const ALL: [VerificationEventId; 9] = [
        Self::Link,
        Self::Inserted,
        Self::Entered,
        Self::Signed,
        Self::Generated,
        Self::Verify,
        Self::Verified,
        Self::Revoke,
        Self::Revoked,
    ];
}

impl std::fmt::Display for VerificationEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Link => "LINK",
            Self::Inserted => "INSERTED",
            Self::Entered => "ENTERED",
            Self::Signed => "SIGNED",
            Self::Generated => "GENERATED",
            Self::Verify => "VERIFY",
            Self::Verified => "VERIFIED",
            Self::Revoke => "REVOKE",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

/// An event of the verification journey with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationEvent {
    /// User asked to link their identity.
    Link,
    /// Signer detected the card.
    Inserted,
    /// User entered the PIN.
    Entered { pin: Pin },
    /// Signer reports the card signed the challenge.
    Signed,
    /// Signer produced the proof.
    Generated { proof: Groth16Proof },
    /// Verification transaction submitted.
    Verify { hash: TxHash },
    /// Verification transaction mined.
    Verified,
    /// Revocation transaction submitted.
    Revoke { hash: TxHash },
    /// Revocation transaction mined.
    Revoked,
}

impl VerificationEvent {
    /// The event a signer message stands for, if it is one of the flow's.
    pub fn from_signer(message: SignerMessage) -> Option<Self> {
        match message {
            SignerMessage::Inserted => Some(Self::Inserted),
            SignerMessage::Signed => Some(Self::Signed),
            SignerMessage::Generated { proof } => Some(Self::Generated { proof }),
            SignerMessage::Other { .. } => None,
        }
    }
}

impl MachineEvent for VerificationEvent {
    type Id = VerificationEventId;

    fn id(&self) -> VerificationEventId {
        match self {
            Self::Link => VerificationEventId::Link,
            Self::Inserted => VerificationEventId::Inserted,
            Self::Entered { .. } => VerificationEventId::Entered,
            Self::Signed => VerificationEventId::Signed,
            Self::Generated { .. } => VerificationEventId::Generated,
            Self::Verify { .. } => VerificationEventId::Verify,
            Self::Verified => VerificationEventId::Verified,
            Self::Revoke { .. } => VerificationEventId::Revoke,
            Self::Revoked => VerificationEventId::Revoked,
        }
    }
}

/// Auxiliary data carried alongside the verification state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationContext {
    /// PIN between `ENTERED` and `SIGNED`.
    pub pin: Option<Pin>,
    /// Proof from `GENERATED` on.
    pub proof: Option<Groth16Proof>,
    /// Hash of the last contract transaction sent.
    pub hash: Option<TxHash>,
    /// Banner text for the identity card.
    pub upper_text: Option<String>,
}

/// The verification journey machine.
pub type VerificationMachine = Machine<VerificationState, VerificationContext, VerificationEvent>;

type VerificationConfig = MachineConfig<VerificationState, VerificationContext, VerificationEvent>;
type VerificationTransition = Transition<VerificationState, VerificationContext, VerificationEvent>;

fn store_hash(ctx: &mut VerificationContext, event: &VerificationEvent) {
    if let VerificationEvent::Verify { hash } | VerificationEvent::Revoke { hash } = event {
        ctx.hash = Some(hash.clone());
    }
}

fn store_pin(ctx: &mut VerificationContext, event: &VerificationEvent) {
    if let VerificationEvent::Entered { pin } = event {
        ctx.pin = Some(pin.clone());
    }
}

fn store_proof(ctx: &mut VerificationContext, event: &VerificationEvent) {
    if let VerificationEvent::Generated { proof } = event {
        ctx.proof = Some(proof.clone());
    }
}

/// The static transition table of the verification journey.
pub fn verification_config() -> VerificationConfig {
    use VerificationEventId as E;
    use VerificationState as S;

    MachineConfig::new(S::Display, VerificationContext::default())
        .on(S::Display, E::Link, VerificationTransition::to(S::InsertCard))
        .on(
            S::Display,
            E::Revoke,
            VerificationTransition::to(S::Revoking).with_action(store_hash),
        )
        .on(
            S::Revoking,
            E::Revoked,
            VerificationTransition::to(S::Display).with_action(|ctx, _| ctx.upper_text = None),
        )
        .on(S::InsertCard, E::Inserted, VerificationTransition::to(S::EnterPin))
        .on(
            S::EnterPin,
            E::Entered,
            VerificationTransition::to(S::Signing).with_action(store_pin),
        )
        .on(
            S::Signing,
            E::Signed,
            VerificationTransition::to(S::GeneratingProof).with_action(|ctx, _| ctx.pin = None),
        )
        .on(
            S::GeneratingProof,
            E::Generated,
            VerificationTransition::to(S::Verify).with_action(store_proof),
        )
        .on(
            S::Verify,
            E::Verify,
            VerificationTransition::to(S::Verifying).with_action(store_hash),
        )
        .on(
            S::Verifying,
            E::Verified,
            VerificationTransition::to(S::Display)
                .with_action(|ctx, _| ctx.upper_text = Some(VERIFIED_UPPER_TEXT.to_string())),
        )
}

/// A fresh verification machine in the `display` state.
pub fn verification_machine() -> VerificationMachine {
    Machine::new(verification_config())
}
