//! # Relay Phase
//!
//! Per-connection view of how far the browser has driven the signer:
//!
//! ```text
//! Idle ──LINK──▶ Linked ──SIGN──▶ Signed
//!   ▲               ▲                │
//!   └── (closed)    └─────LINK───────┘
//! ```
//!
//! The relay does not gate commands on the phase; it only records it so
//! logs show out-of-order traffic (a `SIGN` before any `LINK` is forwarded
//! and fails at the bridge with "not running").

use serde::{Deserialize, Serialize};

use eidas_core::ClientCommand;

/// Where a relay session stands in the signer's lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayPhase {
    /// No signer started on this connection.
    #[default]
    Idle,
    /// The signer was (re)started by `LINK`.
    Linked,
    /// PIN and challenge were written to the signer.
    Signed,
}

impl RelayPhase {
    /// The phase after `command` is handled.
    ///
    /// `LINK` always restarts the signer, so it returns to `Linked` from any
    /// phase. `SIGN` advances only from `Linked`; anywhere else it leaves the
    /// phase unchanged. Unknown commands never change the phase.
    pub fn observe(self, command: &ClientCommand) -> Self {
        match (self, command) {
            (_, ClientCommand::Link) => Self::Linked,
            (Self::Linked, ClientCommand::Sign { .. }) => Self::Signed,
            (phase, _) => phase,
        }
    }

    /// Whether `command` is in the expected order for this phase.
    pub fn expects(&self, command: &ClientCommand) -> bool {
        match command {
            ClientCommand::Link => true,
            ClientCommand::Sign { .. } => *self == Self::Linked,
            ClientCommand::Unknown => false,
        }
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Linked => "linked",
            Self::Signed => "signed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eidas_core::{Challenge, Pin};

    fn sign() -> ClientCommand {
        ClientCommand::sign(Pin::new("0000").unwrap(), &Challenge::new("abc").unwrap())
    }

    #[test]
    fn test_link_then_sign() {
        let phase = RelayPhase::default();
        assert_eq!(phase, RelayPhase::Idle);
        let phase = phase.observe(&ClientCommand::Link);
        assert_eq!(phase, RelayPhase::Linked);
        let phase = phase.observe(&sign());
        assert_eq!(phase, RelayPhase::Signed);
    }

    #[test]
    fn test_link_restarts_from_any_phase() {
        for phase in [RelayPhase::Idle, RelayPhase::Linked, RelayPhase::Signed] {
            assert_eq!(phase.observe(&ClientCommand::Link), RelayPhase::Linked);
        }
    }

    #[test]
    fn test_sign_out_of_order_keeps_phase() {
        assert!(!RelayPhase::Idle.expects(&sign()));
        assert_eq!(RelayPhase::Idle.observe(&sign()), RelayPhase::Idle);
        assert!(!RelayPhase::Signed.expects(&sign()));
        assert_eq!(RelayPhase::Signed.observe(&sign()), RelayPhase::Signed);
    }

    #[test]
    fn test_unknown_command_is_ignored() {
        assert_eq!(
            RelayPhase::Linked.observe(&ClientCommand::Unknown),
            RelayPhase::Linked
        );
        assert!(!RelayPhase::Linked.expects(&ClientCommand::Unknown));
    }

    #[test]
    fn test_display() {
        assert_eq!(RelayPhase::Signed.to_string(), "signed");
    }
}
