//! Out-of-band ack channel between the launcher and a freshly spawned
//! runtime.
//!
//! The launcher listens on an ephemeral loopback port; the runtime
//! connects once its REPL server is up and writes the server's port as
//! an ASCII decimal line. Push beats polling here: the launcher learns
//! the port the moment the runtime is actually ready to serve.

use std::time::Duration;

use replaunch_shared::{LaunchError, LaunchResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

/// Opaque readiness token reported by a spawned runtime.
///
/// Carries the port the runtime's REPL server listens on. At most one
/// token is ever associated with a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckToken(u16);

impl AckToken {
    pub fn port(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for AckToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listener for the runtime's readiness ack.
pub struct AckListener {
    listener: TcpListener,
    port: u16,
}

impl AckListener {
    /// Bind on an ephemeral loopback port.
    pub async fn bind() -> LaunchResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| LaunchError::Launch(format!("failed to bind ack listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| LaunchError::Internal(format!("ack listener has no local addr: {}", e)))?
            .port();

        tracing::debug!(ack_port = port, "listening for runtime ack");
        Ok(Self { listener, port })
    }

    /// Port the spawned runtime must ack to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the runtime to report its server port.
    ///
    /// Returns `Ok(None)` when the timeout elapses first. A connection
    /// that does not carry a parseable port is an error, not a timeout.
    pub async fn wait_for_ack(self, timeout: Duration) -> LaunchResult<Option<AckToken>> {
        match tokio::time::timeout(timeout, self.accept_token()).await {
            Ok(Ok(token)) => Ok(Some(token)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Accept one connection and read the reported port.
    pub(crate) async fn accept_token(&self) -> LaunchResult<AckToken> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| LaunchError::Internal(format!("ack listener accept failed: {}", e)))?;
        tracing::debug!(peer = %addr, "runtime connected to ack listener");

        let mut line = String::new();
        BufReader::new(stream)
            .read_line(&mut line)
            .await
            .map_err(|e| LaunchError::Internal(format!("failed to read ack: {}", e)))?;

        let port = line.trim().parse::<u16>().map_err(|_| {
            LaunchError::Internal(format!("malformed ack from runtime: {:?}", line.trim()))
        })?;

        tracing::info!(repl_port = port, "runtime acked");
        Ok(AckToken(port))
    }
}
