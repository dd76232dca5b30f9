//! # Identity Newtypes
//!
//! Values the user journey carries between browser, relay and signer:
//! the card PIN, the challenge the card signs, and the hash of the
//! on-chain transaction that submitted the proof.
//!
//! ## Security Invariant
//!
//! `Pin` is zeroized on drop and its `Debug` output is redacted, so a PIN
//! never reaches a log line through `{:?}` formatting.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ValidationError;

/// Number of hex digits in a challenge derived from a wallet address.
pub const CHALLENGE_HEX_LEN: usize = 32;

/// Maximum challenge length in bytes (the signer pads to 32 bytes).
const CHALLENGE_MAX_BYTES: usize = 32;

const PIN_MIN_LEN: usize = 4;
const PIN_MAX_LEN: usize = 12;

/// Qualified-signature PIN of an identity card.
///
/// Deserialization is transparent and unvalidated: the relay forwards
/// whatever the browser typed and lets the card reject it. Use
/// [`Pin::new`] where the PIN originates locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    /// Create a validated PIN: 4 to 12 ASCII digits.
    pub fn new(pin: impl Into<String>) -> Result<Self, ValidationError> {
        let pin = Self(pin.into());
        let len = pin.0.len();
        if !(PIN_MIN_LEN..=PIN_MAX_LEN).contains(&len)
            || !pin.0.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ValidationError::InvalidPin {
                min: PIN_MIN_LEN,
                max: PIN_MAX_LEN,
            });
        }
        Ok(pin)
    }

    /// The PIN digits. Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin([REDACTED])")
    }
}

/// The text the identity card signs.
///
/// The signer reads it with a whitespace-delimited scanner and pads it
/// with zero bytes to 32 bytes, so it must be 1-32 printable ASCII
/// characters with no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Challenge(String);

impl Challenge {
    /// Create a validated challenge.
    pub fn new(challenge: impl Into<String>) -> Result<Self, ValidationError> {
        let challenge = challenge.into();
        if challenge.is_empty()
            || challenge.len() > CHALLENGE_MAX_BYTES
            || !challenge.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(ValidationError::InvalidChallenge(challenge));
        }
        Ok(Self(challenge))
    }

    /// Derive the challenge for a wallet address.
    ///
    /// The challenge is the non-checksummed lower 16 bytes of the address:
    /// its last 32 hex digits, lowercased. This keeps the on-chain check a
    /// plain comparison against `msg.sender`.
    pub fn from_address(address: &str) -> Result<Self, ValidationError> {
        let hex = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(address.to_string()));
        }
        Ok(Self(hex[hex.len() - CHALLENGE_HEX_LEN..].to_ascii_lowercase()))
    }

    /// The challenge text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The challenge bytes zero-padded to 32 bytes, as signed by the card
    /// and exposed as the proof's public input.
    pub fn padded_bytes(&self) -> [u8; CHALLENGE_MAX_BYTES] {
        let mut out = [0u8; CHALLENGE_MAX_BYTES];
        out[..self.0.len()].copy_from_slice(self.0.as_bytes());
        out
    }
}

impl TryFrom<String> for Challenge {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Challenge> for String {
    fn from(value: Challenge) -> Self {
        value.0
    }
}

impl std::fmt::Display for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of a submitted EVM transaction (`0x` + 64 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Create a validated transaction hash. The hex digits are lowercased.
    pub fn new(hash: impl Into<String>) -> Result<Self, ValidationError> {
        let hash = hash.into();
        let valid = hash
            .strip_prefix("0x")
            .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()));
        if !valid {
            return Err(ValidationError::InvalidTxHash(hash));
        }
        Ok(Self(hash.to_ascii_lowercase()))
    }

    /// The hash as a `0x`-prefixed string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TxHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
