//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Validation errors name the offending value kind but
//! never echo secret material (PINs).

use thiserror::Error;

/// A value failed its constructor's validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// PIN was empty, too long, or contained non-digit characters.
    #[error("PIN must be {min}-{max} ASCII digits")]
    InvalidPin {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Wallet address was not `0x` followed by 40 hex digits.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Challenge was empty, longer than 32 bytes, or not printable ASCII.
    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),

    /// Transaction hash was not `0x` followed by 64 hex digits.
    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),
}

/// A protocol message could not be decoded.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The text was not valid JSON or did not match the message shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// A Groth16 proof is unusable as contract calldata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// A field element does not fit in a `uint256`.
    #[error("{field} element exceeds 256 bits")]
    Overflow {
        /// Proof component holding the element (`A`, `B`, `C`, `Input`).
        field: &'static str,
    },

    /// The public input vector has the wrong length.
    #[error("public input has {actual} elements, expected {expected}")]
    InputLength {
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },
}
