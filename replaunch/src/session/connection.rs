//! Lazy TCP connection to a REPL endpoint.

use std::sync::Arc;

use replaunch_shared::{Endpoint, LaunchError, LaunchResult};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OnceCell};

/// Lazy connection to a running REPL server.
///
/// Connects on first use so a session handle can be constructed without
/// touching the network; [`Connection::connect`] forces the connection
/// for callers that want attach failures surfaced eagerly.
#[derive(Clone)]
pub struct Connection {
    endpoint: Endpoint,
    stream: Arc<OnceCell<Mutex<TcpStream>>>,
}

impl Connection {
    /// Create a lazy connection (does not connect immediately).
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stream: Arc::new(OnceCell::new()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Force the connection, establishing it if necessary.
    pub async fn connect(&self) -> LaunchResult<()> {
        self.stream().await.map(|_| ())
    }

    /// Write one line to the server.
    pub async fn send_line(&self, line: &str) -> LaunchResult<()> {
        let stream = self.stream().await?;
        let mut stream = stream.lock().await;
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| LaunchError::Attach(format!("write to {} failed: {}", self.endpoint, e)))?;
        stream
            .write_all(b"\n")
            .await
            .map_err(|e| LaunchError::Attach(format!("write to {} failed: {}", self.endpoint, e)))?;
        Ok(())
    }

    /// Shut down the write half if a connection was established.
    pub async fn close(&self) {
        if let Some(stream) = self.stream.get() {
            let mut stream = stream.lock().await;
            if let Err(e) = stream.shutdown().await {
                tracing::debug!("failed to shut down connection to {}: {}", self.endpoint, e);
            }
        }
    }

    async fn stream(&self) -> LaunchResult<&Mutex<TcpStream>> {
        self.stream
            .get_or_try_init(|| async {
                tracing::debug!("connecting to {}", self.endpoint);
                let stream = TcpStream::connect(self.endpoint.authority())
                    .await
                    .map_err(|e| {
                        LaunchError::Attach(format!("could not connect to {}: {}", self.endpoint, e))
                    })?;
                Ok(Mutex::new(stream))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_lazy_connect_and_send() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            stream.read_to_string(&mut buf).await.unwrap();
            buf
        });

        let connection = Connection::new(Endpoint::local(port));
        connection.send_line("(in-ns 'user)").await.unwrap();
        connection.close().await;

        assert_eq!(server.await.unwrap(), "(in-ns 'user)\n");
    }

    #[tokio::test]
    async fn test_connect_failure_is_attach_error() {
        // Port 1 on loopback is essentially never listening.
        let connection = Connection::new(Endpoint::local(1));
        let result = connection.connect().await;
        assert!(matches!(result, Err(LaunchError::Attach(_))));
    }
}
