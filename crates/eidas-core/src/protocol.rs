//! # Wire Protocol
//!
//! Two line-oriented JSON protocols meet at the relay:
//!
//! - **Browser → relay** ([`ClientCommand`]): WebSocket text frames with a
//!   required `id` discriminator, `{"id":"LINK"}` or
//!   `{"id":"SIGN","pin":"…","challenge":"…"}`. Unrecognised ids decode to
//!   [`ClientCommand::Unknown`] and are ignored by the relay.
//!
//! - **Signer → relay → browser** ([`SignerMessage`]): one JSON object per
//!   stdout line, `{"id":"INSERTED"}`, `{"id":"SIGNED"}`,
//!   `{"id":"GENERATED","proof":{…}}`. The relay forwards the line text
//!   unchanged; `SignerMessage` is the typed view for consumers that act on
//!   it (the verification flow, logging, the mock signer).

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::identity::{Challenge, Pin};
use crate::proof::Groth16Proof;

/// A command sent by the browser over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum ClientCommand {
    /// Start the signer: begins the card/proof flow.
    #[serde(rename = "LINK")]
    Link,

    /// Hand the PIN and challenge to the running signer.
    #[serde(rename = "SIGN")]
    Sign {
        /// Card PIN, forwarded unvalidated.
        pin: Pin,
        /// Challenge text, forwarded unvalidated.
        challenge: String,
    },

    /// Any other `id`.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl ClientCommand {
    /// Decode a WebSocket text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a `SIGN` command from locally validated values.
    pub fn sign(pin: Pin, challenge: &Challenge) -> Self {
        Self::Sign {
            pin,
            challenge: challenge.as_str().to_string(),
        }
    }

    /// The wire discriminator.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Link => "LINK",
            Self::Sign { .. } => "SIGN",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Encode as a WebSocket text frame.
    pub fn to_text(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Typed view of one signer output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerMessage {
    /// An identity card was detected.
    Inserted,
    /// The card signed the challenge.
    Signed,
    /// The proof is ready.
    Generated {
        /// The Groth16 proof binding the challenge.
        proof: Groth16Proof,
    },
    /// A message with an id this crate does not model.
    Other {
        /// The raw discriminator.
        id: String,
    },
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
}

#[derive(Deserialize)]
struct GeneratedBody {
    proof: Groth16Proof,
}

impl SignerMessage {
    /// Decode one signer line.
    ///
    /// The discriminator is read first; the payload is then decoded from
    /// the same text so proof integers keep full precision.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        Ok(match envelope.id.as_str() {
            "INSERTED" => Self::Inserted,
            "SIGNED" => Self::Signed,
            "GENERATED" => {
                let body: GeneratedBody = serde_json::from_str(line)?;
                Self::Generated { proof: body.proof }
            }
            _ => Self::Other { id: envelope.id },
        })
    }

    /// The wire discriminator.
    pub fn id(&self) -> &str {
        match self {
            Self::Inserted => "INSERTED",
            Self::Signed => "SIGNED",
            Self::Generated { .. } => "GENERATED",
            Self::Other { id } => id,
        }
    }

    /// Encode as the signer prints it, one line without the newline.
    pub fn to_line(&self) -> String {
        match self {
            Self::Generated { proof } => {
                format!(r#"{{"id":"GENERATED","proof":{}}}"#, proof.to_signer_json())
            }
            other => format!(r#"{{"id":{}}}"#, serde_json::Value::from(other.id())),
        }
    }
}
