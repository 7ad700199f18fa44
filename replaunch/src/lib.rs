//! Replaunch - launch a REPL-capable runtime and attach a session to it.
//!
//! A launch goes through four steps:
//!
//! 1. Bind an ack listener on an ephemeral loopback port.
//! 2. Spawn the runtime process, pointing it at the ack port.
//! 3. Wait for the runtime to report its own server port over the ack
//!    channel, racing a timeout and a user cancellation signal.
//! 4. Run the optional workspace refresh, then attach a REPL session to
//!    the reported endpoint.
//!
//! [`coordinator::LaunchAckCoordinator`] drives the whole pipeline. The
//! process launcher, session connector, and workspace refresher are trait
//! seams so embedders can substitute their own.

pub mod ack;
pub mod coordinator;
pub mod launch;
pub mod reload;
pub mod session;

pub use replaunch_shared::{Endpoint, LaunchError, LaunchResult, constants};

pub use ack::{AckListener, AckToken};
pub use coordinator::{LaunchAckCoordinator, LaunchOutcome, LaunchPhase, WaitHandle};
pub use launch::{CommandLauncher, LaunchRequest, LaunchedProcess, ProcessLauncher};
pub use reload::{NoopRefresher, RefreshGate, WorkspaceRefresher};
pub use session::{AttachOptions, ConsoleSink, ReplSession, SessionConnector, TcpConnector};
