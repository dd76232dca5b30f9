//! # Process Bridge
//!
//! Spawns the signer with piped standard streams and supervises it:
//!
//! - **stdin**: [`ProcessBridge::send`] writes one line and flushes.
//! - **stdout**: a reader task splits on newlines, decodes each line per
//!   [`OutputMode`] and pushes it to the [`BridgeReceiver`].
//! - **stderr**: a second task logs each line at `debug`.
//!
//! At most one child exists per bridge. `start()` on a running bridge kills
//! and reaps the old child before spawning the new one.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use eidas_core::{ProtocolError, SignerMessage};

use crate::config::{BridgeConfig, OutputMode};
use crate::error::BridgeError;

// -- Output lines -------------------------------------------------------------

/// One line of signer stdout, exactly as printed (without the newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerLine(String);

impl SignerLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Typed view of the line.
    pub fn message(&self) -> Result<SignerMessage, ProtocolError> {
        SignerMessage::parse(&self.0)
    }
}

impl std::fmt::Display for SignerLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

type Delivery = (u64, Result<SignerLine, BridgeError>);

/// The single consumer of a bridge's output.
///
/// Yields lines of the current process generation only.
#[derive(Debug)]
pub struct BridgeReceiver {
    rx: mpsc::UnboundedReceiver<Delivery>,
    generation: Arc<AtomicU64>,
}

impl BridgeReceiver {
    /// Next line or error from the running signer.
    ///
    /// Cancel-safe. Returns `None` once the bridge and all its reader tasks
    /// are gone.
    pub async fn recv(&mut self) -> Option<Result<SignerLine, BridgeError>> {
        loop {
            let (generation, item) = self.rx.recv().await?;
            if generation == self.generation.load(Ordering::Acquire) {
                return Some(item);
            }
            tracing::trace!(generation, "dropping output of a replaced signer");
        }
    }
}

// -- Bridge -------------------------------------------------------------------

struct Running {
    child: Child,
    stdin: ChildStdin,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

/// Supervisor of the signer child process.
pub struct ProcessBridge {
    config: BridgeConfig,
    tx: mpsc::UnboundedSender<Delivery>,
    generation: Arc<AtomicU64>,
    running: Option<Running>,
}

impl ProcessBridge {
    /// Create an idle bridge and the receiver for its output.
    pub fn new(config: BridgeConfig) -> (Self, BridgeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let receiver = BridgeReceiver {
            rx,
            generation: Arc::clone(&generation),
        };
        let bridge = Self {
            config,
            tx,
            generation,
            running: None,
        };
        (bridge, receiver)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn the signer, replacing any running instance.
    pub async fn start(&mut self) -> Result<(), BridgeError> {
        if self.running.is_some() {
            tracing::debug!("signer already running, restarting");
            self.kill().await?;
        }

        let program = self.config.program.display().to_string();
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.config.kill_on_disconnect);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| BridgeError::Spawn {
            program: program.clone(),
            source,
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or(BridgeError::StdioUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(BridgeError::StdioUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(BridgeError::StdioUnavailable("stderr"))?;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let pid = child.id();
        let stdout_task = tokio::spawn(read_stdout(
            stdout,
            self.config.output,
            generation,
            self.tx.clone(),
        ));
        let stderr_task = tokio::spawn(log_stderr(stderr, pid));

        tracing::info!(program = %program, pid, generation, "signer started");
        self.running = Some(Running {
            child,
            stdin,
            stdout_task,
            stderr_task,
        });
        Ok(())
    }

    /// Write `text` followed by a newline to the signer's stdin.
    pub async fn send(&mut self, text: &str) -> Result<(), BridgeError> {
        if !self.is_running() {
            return Err(BridgeError::NotRunning);
        }
        let running = self.running.as_mut().ok_or(BridgeError::NotRunning)?;
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        running.stdin.write_all(line.as_bytes()).await?;
        running.stdin.flush().await?;
        Ok(())
    }

    /// Terminate the signer and wait for it to exit. No-op when idle.
    pub async fn kill(&mut self) -> Result<(), BridgeError> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };
        // Bump first so anything already queued from this child is stale.
        self.generation.fetch_add(1, Ordering::AcqRel);
        running.stdout_task.abort();
        running.stderr_task.abort();

        let pid = running.child.id();
        match running.child.kill().await {
            Ok(()) => {}
            // Already exited and reaped.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(BridgeError::Io(e)),
        }
        tracing::info!(pid, "signer killed");
        Ok(())
    }

    /// Whether a signer is running. Reaps a child that exited by itself.
    pub fn is_running(&mut self) -> bool {
        let Some(running) = self.running.as_mut() else {
            return false;
        };
        match running.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!(%status, "signer exited");
                self.running = None;
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll signer status");
                self.running = None;
                false
            }
        }
    }

    /// OS process id of the running signer.
    pub fn pid(&mut self) -> Option<u32> {
        if !self.is_running() {
            return None;
        }
        self.running.as_ref().and_then(|r| r.child.id())
    }
}

impl std::fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("program", &self.config.program)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("running", &self.running.is_some())
            .finish()
    }
}

// -- Reader tasks -------------------------------------------------------------

fn decode(mode: OutputMode, line: String) -> Result<SignerLine, BridgeError> {
    match mode {
        OutputMode::Raw => Ok(SignerLine(line)),
        OutputMode::Json => match serde_json::from_str::<serde::de::IgnoredAny>(&line) {
            Ok(_) => Ok(SignerLine(line)),
            Err(source) => Err(BridgeError::MalformedOutput { line, source }),
        },
    }
}

async fn read_stdout<R>(
    stdout: R,
    mode: OutputMode,
    generation: u64,
    tx: mpsc::UnboundedSender<Delivery>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            // Only raw mode tolerates blank lines; in json mode they are malformed output.
            Ok(Some(line)) if mode == OutputMode::Raw && line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                tracing::debug!(generation, line = %line, "signer output");
                if tx.send((generation, decode(mode, line))).is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(generation, "signer stdout closed");
                break;
            }
            Err(e) => {
                let _ = tx.send((generation, Err(BridgeError::Io(e))));
                break;
            }
        }
    }
}

async fn log_stderr<R>(stderr: R, pid: Option<u32>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(pid, "signer stderr: {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_keeps_text_unchanged() {
        let line = r#"{ "id" : "GENERATED", "proof": {"A": [123456789012345678901234567890, 1]} }"#;
        let decoded = decode(OutputMode::Json, line.to_string()).unwrap();
        assert_eq!(decoded.as_str(), line);
    }

    #[test]
    fn test_decode_json_rejects_text() {
        let err = decode(OutputMode::Json, "CCSF open failed".into()).unwrap_err();
        match err {
            BridgeError::MalformedOutput { line, .. } => assert_eq!(line, "CCSF open failed"),
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_json_rejects_trailing_garbage() {
        assert!(decode(OutputMode::Json, r#"{"id":"SIGNED"} extra"#.into()).is_err());
    }

    #[test]
    fn test_decode_json_rejects_blank_line() {
        match decode(OutputMode::Json, "   ".into()) {
            Err(BridgeError::MalformedOutput { line, .. }) => assert_eq!(line, "   "),
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_raw_accepts_anything() {
        let decoded = decode(OutputMode::Raw, "plain text".into()).unwrap();
        assert_eq!(decoded.to_string(), "plain text");
    }

    #[test]
    fn test_signer_line_message() {
        let line = SignerLine(r#"{"id":"INSERTED"}"#.into());
        assert_eq!(line.message().unwrap(), SignerMessage::Inserted);
    }

    #[tokio::test]
    async fn test_send_while_idle_is_not_running() {
        let (mut bridge, _rx) = ProcessBridge::new(BridgeConfig::default());
        assert!(!bridge.is_running());
        assert!(bridge.pid().is_none());
        assert!(matches!(bridge.send("1234").await, Err(BridgeError::NotRunning)));
    }

    #[tokio::test]
    async fn test_kill_while_idle_is_noop() {
        let (mut bridge, _rx) = ProcessBridge::new(BridgeConfig::default());
        bridge.kill().await.unwrap();
        bridge.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure_names_program() {
        let (mut bridge, _rx) = ProcessBridge::new(BridgeConfig::new("/nonexistent/eidas-signer"));
        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/eidas-signer"));
        assert!(!bridge.is_running());
    }
}
