//! Constants shared between the launcher and the command-line frontend.

/// Timeouts for the launch pipeline.
pub mod timeouts {
    /// Default time to wait for a freshly started runtime to report its
    /// server port over the ack channel.
    pub const ACK_TIMEOUT_MS: u64 = 600_000;

    /// Upper bound on the pre-attach workspace refresh wait.
    ///
    /// The attach path must never block indefinitely on a refresh that
    /// fails to signal completion; after this bound the attach proceeds.
    pub const REFRESH_WAIT_MS: u64 = 30_000;
}

/// Environment variables exported to the spawned runtime.
pub mod env {
    /// Unique id of this launch, one per request.
    pub const LAUNCH_ID: &str = "REPLAUNCH_LAUNCH_ID";

    /// Port of the launcher's ack listener. The runtime connects to this
    /// port and writes its own server port once it is ready to serve.
    pub const ACK_PORT: &str = "REPLAUNCH_ACK_PORT";

    /// Classpath rendered for runtimes that resolve code through one.
    pub const CLASSPATH: &str = "CLASSPATH";
}

/// REPL conventions.
pub mod repl {
    /// Namespace a fresh session starts in when none is configured.
    pub const DEFAULT_NAMESPACE: &str = "user";

    /// Argument pair that marks the headless REPL sub-command in a
    /// project-tool invocation. File-load injections are spliced in
    /// front of this marker.
    pub const HEADLESS_MARKER: [&str; 2] = ["repl", ":headless"];
}
