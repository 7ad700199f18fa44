//! Session attach: turning an acked endpoint into a live REPL session.

mod connection;
mod console;

pub use connection::Connection;
pub use console::{BufferConsole, ConsoleSink, NullConsole, TracingConsole};

use std::sync::Arc;

use async_trait::async_trait;
use replaunch_shared::constants::repl;
use replaunch_shared::{Endpoint, LaunchResult};

/// Options for attaching a session to an acked runtime.
#[derive(Clone)]
pub struct AttachOptions {
    /// Console the session renders into. Request-scoped; there is no
    /// process-wide "last opened console" fallback.
    pub console: Arc<dyn ConsoleSink>,

    /// Bring the console to the foreground once attached.
    pub activate: bool,

    /// Namespace to switch the session into after attaching. A failed
    /// switch is logged, not fatal.
    pub initial_namespace: Option<String>,
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            console: Arc::new(NullConsole),
            activate: false,
            initial_namespace: None,
        }
    }
}

/// Establishes a session with a runtime at a known endpoint.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn attach(
        &self,
        endpoint: &Endpoint,
        options: &AttachOptions,
    ) -> LaunchResult<ReplSession>;
}

/// Handle to an interactive session with a running REPL server.
///
/// The underlying connection is lazy, so a handle can exist before any
/// traffic flows ([`TcpConnector`] forces it during attach).
pub struct ReplSession {
    connection: Connection,
    namespace: std::sync::Mutex<String>,
}

impl ReplSession {
    /// Create a session handle for an endpoint without connecting.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            connection: Connection::new(endpoint),
            namespace: std::sync::Mutex::new(repl::DEFAULT_NAMESPACE.to_string()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.connection.endpoint()
    }

    /// Namespace the session currently sits in.
    pub fn namespace(&self) -> String {
        self.namespace
            .lock()
            .map(|ns| ns.clone())
            .unwrap_or_else(|_| repl::DEFAULT_NAMESPACE.to_string())
    }

    /// Send one form to the server.
    pub async fn send(&self, form: &str) -> LaunchResult<()> {
        self.connection.send_line(form).await
    }

    /// Switch the session into `namespace`.
    pub async fn set_namespace(&self, namespace: &str) -> LaunchResult<()> {
        self.connection
            .send_line(&format!("(in-ns '{})", namespace))
            .await?;
        if let Ok(mut ns) = self.namespace.lock() {
            *ns = namespace.to_string();
        }
        Ok(())
    }

    /// Close the session connection. The runtime keeps running.
    pub async fn close(&self) {
        self.connection.close().await;
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}

/// Default connector: plain TCP to the acked endpoint.
#[derive(Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionConnector for TcpConnector {
    async fn attach(
        &self,
        endpoint: &Endpoint,
        options: &AttachOptions,
    ) -> LaunchResult<ReplSession> {
        let session = ReplSession::new(endpoint.clone());

        // Force the connection so attach failures surface here instead
        // of on the first eval.
        session.connection().connect().await?;

        options.console.append(&format!("connected to {}", endpoint));
        if options.activate {
            options.console.activate();
        }

        if let Some(namespace) = &options.initial_namespace {
            if let Err(e) = session.set_namespace(namespace).await {
                tracing::error!(
                    "could not start session in namespace {}: {}",
                    namespace,
                    e
                );
            }
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_attach_connects_and_sets_namespace() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            stream.read_to_string(&mut buf).await.unwrap();
            buf
        });

        let console = Arc::new(BufferConsole::new());
        let options = AttachOptions {
            console: console.clone(),
            activate: true,
            initial_namespace: Some("app.core".to_string()),
        };

        let endpoint = Endpoint::local(port);
        let session = TcpConnector::new().attach(&endpoint, &options).await.unwrap();
        assert_eq!(session.endpoint(), &endpoint);
        assert_eq!(session.namespace(), "app.core");
        session.close().await;

        assert!(server.await.unwrap().contains("(in-ns 'app.core)"));
        assert!(console.was_activated());
        assert!(console.lines().iter().any(|l| l.contains(&endpoint.to_uri())));
    }

    #[tokio::test]
    async fn test_attach_to_dead_endpoint_fails() {
        let endpoint = Endpoint::local(1);
        let result = TcpConnector::new()
            .attach(&endpoint, &AttachOptions::default())
            .await;
        assert!(result.is_err());
    }
}
