//! End-to-end: the `link` flow through a real relay to the `mock-signer`
//! binary.

use std::net::SocketAddr;
use std::time::Duration;

use eidas_api::{StatusBoard, WsServer};
use eidas_bridge::BridgeConfig;
use eidas_cli::link::link;
use eidas_core::{Challenge, Pin, PROOF_INPUT_LEN};
use eidas_state::VerificationState;

const ADDRESS: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
const CHALLENGE: &str = "c7ab88b098defb751b7401b5f6d8976f";

fn mock_signer() -> BridgeConfig {
    BridgeConfig::new(env!("CARGO_BIN_EXE_mock-signer")).with_args(["--delay-ms", "50"])
}

async fn relay() -> (WsServer, StatusBoard, SocketAddr) {
    let board = StatusBoard::new();
    let mut server = WsServer::new(mock_signer(), board.clone());
    let addr = server.start("127.0.0.1:0".parse().unwrap()).await.unwrap();
    (server, board, addr)
}

#[tokio::test]
async fn test_link_flow_against_mock_signer() {
    let (mut server, board, addr) = relay().await;
    let challenge = Challenge::from_address(ADDRESS).unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        link(&format!("ws://{addr}"), Pin::new("123456").unwrap(), &challenge),
    )
    .await
    .expect("flow timed out")
    .unwrap();

    assert_eq!(outcome.challenge.as_str(), CHALLENGE);
    assert!(outcome.proof.binds_challenge(&challenge));
    assert_eq!(outcome.calldata.input.len(), PROOF_INPUT_LEN);
    assert_eq!(outcome.calldata.input[0], u32::from(b'c').to_string());
    assert_eq!(
        outcome.states,
        vec![
            VerificationState::Display,
            VerificationState::InsertCard,
            VerificationState::EnterPin,
            VerificationState::Signing,
            VerificationState::GeneratingProof,
            VerificationState::Verify,
        ]
    );
    assert_eq!(board.relay().commands_received(), 2);
    // The counter is bumped after the send completes.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while board.relay().frames_forwarded() < 3 {
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(board.relay().frames_forwarded(), 3);

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_link_binary_prints_calldata() {
    let (mut server, _, addr) = relay().await;

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_eidas-bridge"))
        .args([
            "link",
            "--address",
            ADDRESS,
            "--pin",
            "123456",
            "--url",
            &format!("ws://{addr}"),
            "--timeout-secs",
            "30",
        ])
        .output()
        .await
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["function"], "identityVerification");
    assert_eq!(printed["challenge"], CHALLENGE);
    assert_eq!(printed["args"]["input"].as_array().unwrap().len(), PROOF_INPUT_LEN);
    assert!(printed["args"]["a"][0].as_str().unwrap().len() > 20);

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_link_binary_rejects_bad_address() {
    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_eidas-bridge"))
        .args(["link", "--address", "0x1234", "--pin", "123456"])
        .output()
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_link_fails_when_relay_is_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let challenge = Challenge::from_address(ADDRESS).unwrap();
    let err = link(&format!("ws://{addr}"), Pin::new("123456").unwrap(), &challenge)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to connect to relay"));
}

#[test]
fn test_serve_with_missing_config_exits_1() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_eidas-bridge"))
        .args(["--config", "/nonexistent/eidas.yaml", "serve"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/eidas.yaml"));
}
