//! # Mock Signer
//!
//! Stands in for the signer binary during development and tests. Speaks the
//! same line protocol:
//!
//! 1. after a short delay, print `{"id":"INSERTED"}`;
//! 2. read the PIN line, then the challenge line;
//! 3. print `{"id":"SIGNED"}`, then `{"id":"GENERATED","proof":{…}}`.
//!
//! The proof points are fixed; its public input encodes the challenge, so
//! `binds_challenge` holds for the challenge that was sent.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use zeroize::Zeroizing;

use eidas_core::{Challenge, FieldElement, Groth16Proof, SignerMessage};

/// Arguments of the mock signer.
#[derive(Args, Debug, Clone)]
pub struct MockArgs {
    /// Delay before reporting the card as inserted.
    #[arg(long, default_value_t = 2500)]
    pub delay_ms: u64,
}

// Points near the BN254 scalar field modulus, so every coordinate needs
// more than 64 bits.
const POINTS: [&str; 8] = [
    "21888242871839275222246405745257275088548364400416034343698204186575808495616",
    "21888242871839275222246405745257275088548364400416034343698204186575808495615",
    "11559732032986387107991004021392285783925812861821192530917403151452391805634",
    "10857046999023057135944570762232829481370756359578518086990519993285655852781",
    "4082367875863433681332203403145435568316851327593401208105741076214120093531",
    "8495653923123431417604973247489272438418190587263600148770280649306958101930",
    "19823750034577325393471232198403928379828192712839847223917812763190237291833",
    "1368015179489954701390400359078579693043519447331113978918064868415326638035",
];

fn element(decimal: &str) -> Result<FieldElement> {
    FieldElement::from_json_token(decimal).map_err(|e| anyhow!(e))
}

/// The fixed proof for `challenge`.
pub fn proof_for(challenge: &Challenge) -> Result<Groth16Proof> {
    Ok(Groth16Proof {
        a: [element(POINTS[0])?, element(POINTS[1])?],
        b: [
            [element(POINTS[2])?, element(POINTS[3])?],
            [element(POINTS[4])?, element(POINTS[5])?],
        ],
        c: [element(POINTS[6])?, element(POINTS[7])?],
        input: Groth16Proof::public_input_for(challenge),
    })
}

fn read_line(input: &mut impl BufRead, what: &str) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    let read = input
        .read_line(&mut line)
        .with_context(|| format!("failed to read {what}"))?;
    if read == 0 {
        bail!("stdin closed before {what}");
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn emit(output: &mut impl Write, message: &SignerMessage) -> Result<()> {
    writeln!(output, "{}", message.to_line())?;
    output.flush()?;
    Ok(())
}

/// Run one signing session over `input`/`output`.
pub fn run_mock(args: &MockArgs, mut input: impl BufRead, mut output: impl Write) -> Result<u8> {
    std::thread::sleep(Duration::from_millis(args.delay_ms));
    emit(&mut output, &SignerMessage::Inserted)?;

    let pin = read_line(&mut input, "PIN")?;
    if pin.is_empty() {
        bail!("empty PIN");
    }
    let challenge = read_line(&mut input, "challenge")?;
    let challenge = Challenge::new(challenge.as_str())?;
    tracing::debug!(challenge = %challenge, "signing challenge");
    emit(&mut output, &SignerMessage::Signed)?;

    let proof = proof_for(&challenge)?;
    emit(&mut output, &SignerMessage::Generated { proof })?;
    Ok(0)
}
