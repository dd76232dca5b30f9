//! # Link Subcommand
//!
//! Drives the identity verification flow from a terminal, playing the part
//! of the web app against a running relay:
//!
//! ```text
//! LINK ─▶ (INSERTED) ─▶ SIGN{pin, challenge} ─▶ (SIGNED) ─▶ (GENERATED)
//! ```
//!
//! Progress follows the verification state machine, so signer messages that
//! arrive out of order are rejected exactly as the web app would. The
//! resulting proof must bind the challenge derived from `--address`; its
//! `identityVerification` calldata is printed as JSON on stdout.

use std::io::BufRead;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use zeroize::Zeroizing;

use eidas_core::{Challenge, ClientCommand, Groth16Proof, Pin, SignerMessage, VerificationCalldata};
use eidas_state::{verification_machine, VerificationEvent, VerificationMachine, VerificationState};

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8081";

/// Arguments for the `link` subcommand.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Wallet address the proof is bound to (`0x` + 40 hex digits).
    #[arg(long)]
    pub address: String,

    /// Card PIN. Read from stdin when omitted.
    #[arg(long)]
    pub pin: Option<String>,

    /// Relay URL.
    #[arg(long, default_value = DEFAULT_RELAY_URL)]
    pub url: String,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

/// Result of a completed flow.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub challenge: Challenge,
    pub proof: Groth16Proof,
    pub calldata: VerificationCalldata,
    /// States visited, starting with `display`.
    pub states: Vec<VerificationState>,
}

/// Execute the link subcommand.
pub async fn run_link(args: &LinkArgs) -> Result<u8> {
    let challenge = Challenge::from_address(&args.address)?;
    let pin = match &args.pin {
        Some(pin) => Pin::new(pin.as_str())?,
        None => read_pin()?,
    };

    let limit = Duration::from_secs(args.timeout_secs);
    let outcome = tokio::time::timeout(limit, link(&args.url, pin, &challenge))
        .await
        .map_err(|_| anyhow!("verification did not finish within {}s", args.timeout_secs))??;

    let output = serde_json::json!({
        "function": outcome.calldata.function(),
        "challenge": outcome.challenge.as_str(),
        "args": outcome.calldata,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}

fn read_pin() -> Result<Pin> {
    eprint!("PIN: ");
    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read PIN from stdin")?;
    Ok(Pin::new(line.trim_end_matches(['\r', '\n']))?)
}

/// Progress line for `state`; states that wait on the card or the prover
/// end in an ellipsis.
fn status_line(state: VerificationState) -> Option<String> {
    let (title, detail) = state.status_text()?;
    let ellipsis = if state.is_busy() { "..." } else { "" };
    Some(format!("{title}: {detail}{ellipsis}"))
}

fn report(machine: &VerificationMachine) {
    let state = machine.current();
    tracing::info!(state = %state, busy = state.is_busy(), "verification state");
    if let Some(line) = status_line(state) {
        eprintln!("{line}");
    }
}

/// Run the flow against the relay at `url` until the proof is ready.
pub async fn link(url: &str, pin: Pin, challenge: &Challenge) -> Result<LinkOutcome> {
    let (mut socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .with_context(|| format!("failed to connect to relay at {url}"))?;
    tracing::debug!(url, challenge = %challenge, "connected to relay");

    let mut machine = verification_machine();
    machine.send(VerificationEvent::Link)?;
    socket
        .send(Message::Text(ClientCommand::Link.to_text()?))
        .await?;
    report(&machine);

    let mut pin = Some(pin);
    while machine.current() != VerificationState::Verify {
        let message = socket
            .next()
            .await
            .ok_or_else(|| anyhow!("relay closed the connection"))??;
        let text = match message {
            Message::Text(text) => text,
            Message::Close(frame) => bail!("relay ended the session: {frame:?}"),
            _ => continue,
        };

        let signer = SignerMessage::parse(&text).context("unreadable signer message")?;
        let Some(event) = VerificationEvent::from_signer(signer.clone()) else {
            tracing::debug!(id = signer.id(), "ignoring signer message");
            continue;
        };
        machine.send(event)?;
        report(&machine);

        if machine.current() == VerificationState::EnterPin {
            let pin = pin
                .take()
                .ok_or_else(|| anyhow!("signer asked for the PIN twice"))?;
            machine.send(VerificationEvent::Entered { pin: pin.clone() })?;
            socket
                .send(Message::Text(ClientCommand::sign(pin, challenge).to_text()?))
                .await?;
            report(&machine);
        }
    }
    let _ = socket.close(None).await;

    let proof = machine
        .context()
        .proof
        .clone()
        .ok_or_else(|| anyhow!("flow finished without a proof"))?;
    if !proof.binds_challenge(challenge) {
        bail!("proof does not bind challenge {challenge}");
    }
    let calldata = proof.calldata()?;

    let mut states = vec![VerificationState::Display];
    states.extend(machine.history().iter().map(|record| record.to));
    Ok(LinkOutcome {
        challenge: challenge.clone(),
        proof,
        calldata,
        states,
    })
}
