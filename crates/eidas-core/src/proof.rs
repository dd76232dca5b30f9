//! # Groth16 Proof Model
//!
//! The signer prints its proof as
//!
//! ```text
//! {"id":"GENERATED","proof":{"A":[a0,a1],"B":[[b00,b01],[b10,b11]],"C":[c0,c1],"Input":[i0,…,i31]}}
//! ```
//!
//! where every element is a BN254 field element written as a bare JSON
//! integer, far beyond `u64`. [`FieldElement`] captures the raw JSON token
//! and parses it as a `BigUint`, so no precision is lost. Quoted decimal
//! strings are accepted too, which is also the serialized form.
//!
//! Deserialization of [`FieldElement`] relies on `serde_json`'s raw value
//! support: parse proofs from text with `serde_json::from_str`, not through
//! `serde_json::Value`.
//!
//! The proof is consumed by the verifier contract as
//! `identityVerification(uint256[2] a, uint256[2][2] b, uint256[2] c, uint256[32] input)`.

use num_bigint::BigUint;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::ProofError;
use crate::identity::Challenge;

/// Number of public inputs: one per challenge byte.
pub const PROOF_INPUT_LEN: usize = 32;

/// Name of the verifier contract function taking the proof.
pub const IDENTITY_VERIFICATION_FN: &str = "identityVerification";

const UINT256_BITS: u64 = 256;

/// A non-negative integer proof component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// Wrap an integer.
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    /// Parse a JSON token: a bare integer literal or a quoted decimal string.
    pub fn from_json_token(token: &str) -> Result<Self, String> {
        let token = token.trim();
        let digits = if token.starts_with('"') {
            serde_json::from_str::<String>(token).map_err(|e| e.to_string())?
        } else {
            token.to_string()
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("expected a non-negative decimal integer, got {token}"));
        }
        BigUint::parse_bytes(digits.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| format!("unparseable integer {token}"))
    }

    /// Decimal representation.
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    fn fits_uint256(&self) -> bool {
        self.0.bits() <= UINT256_BITS
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_json_token(raw.get()).map_err(de::Error::custom)
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Groth16 proof over BN254 with its public input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// G1 point `A`.
    #[serde(rename = "A")]
    pub a: [FieldElement; 2],
    /// G2 point `B`.
    #[serde(rename = "B")]
    pub b: [[FieldElement; 2]; 2],
    /// G1 point `C`.
    #[serde(rename = "C")]
    pub c: [FieldElement; 2],
    /// Public input: the zero-padded challenge, one byte per element.
    #[serde(rename = "Input")]
    pub input: Vec<FieldElement>,
}

impl Groth16Proof {
    /// The public input the signer derives from a challenge.
    pub fn public_input_for(challenge: &Challenge) -> Vec<FieldElement> {
        challenge
            .padded_bytes()
            .iter()
            .map(|b| FieldElement::from(u64::from(*b)))
            .collect()
    }

    /// Whether this proof's public input encodes `challenge`.
    pub fn binds_challenge(&self, challenge: &Challenge) -> bool {
        self.input == Self::public_input_for(challenge)
    }

    /// The proof as the signer prints it, with bare integer literals.
    pub fn to_signer_json(&self) -> String {
        let list = |elements: &[FieldElement]| {
            elements
                .iter()
                .map(FieldElement::to_decimal)
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            r#"{{"A":[{}],"B":[[{}],[{}]],"C":[{}],"Input":[{}]}}"#,
            list(&self.a[..]),
            list(&self.b[0][..]),
            list(&self.b[1][..]),
            list(&self.c[..]),
            list(&self.input[..]),
        )
    }

    /// Render the proof as `identityVerification` arguments.
    pub fn calldata(&self) -> Result<VerificationCalldata, ProofError> {
        if self.input.len() != PROOF_INPUT_LEN {
            return Err(ProofError::InputLength {
                expected: PROOF_INPUT_LEN,
                actual: self.input.len(),
            });
        }
        let a = encode_pair("A", &self.a)?;
        let b = [encode_pair("B", &self.b[0])?, encode_pair("B", &self.b[1])?];
        let c = encode_pair("C", &self.c)?;
        let input = self
            .input
            .iter()
            .map(|e| encode("Input", e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VerificationCalldata { a, b, c, input })
    }
}

fn encode(field: &'static str, element: &FieldElement) -> Result<String, ProofError> {
    if !element.fits_uint256() {
        return Err(ProofError::Overflow { field });
    }
    Ok(element.to_decimal())
}

fn encode_pair(field: &'static str, pair: &[FieldElement; 2]) -> Result<[String; 2], ProofError> {
    Ok([encode(field, &pair[0])?, encode(field, &pair[1])?])
}

/// Decimal-string arguments for `identityVerification(a, b, c, input)`,
/// ready to hand to a wallet RPC library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCalldata {
    /// `uint256[2] a`
    pub a: [String; 2],
    /// `uint256[2][2] b`
    pub b: [[String; 2]; 2],
    /// `uint256[2] c`
    pub c: [String; 2],
    /// `uint256[32] input`
    pub input: Vec<String>,
}

impl VerificationCalldata {
    /// The contract function these arguments belong to.
    pub fn function(&self) -> &'static str {
        IDENTITY_VERIFICATION_FN
    }
}
