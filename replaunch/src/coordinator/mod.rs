//! Launch ack coordination.
//!
//! Bridges a fire-and-forget process launch with the runtime's
//! asynchronous readiness signal: [`LaunchAckCoordinator::start`] spawns
//! the runtime and begins listening for its ack,
//! [`LaunchAckCoordinator::wait`] races the ack against a timeout and a
//! user cancellation signal and resolves the launch exactly once.

mod state;

pub use state::{LaunchPhase, LaunchState};

use std::sync::Arc;
use std::time::Duration;

use replaunch_shared::constants::timeouts;
use replaunch_shared::{Endpoint, LaunchError, LaunchResult};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ack::{AckListener, AckToken};
use crate::launch::{CommandLauncher, LaunchRequest, LaunchedProcess, ProcessLauncher, stats};
use crate::reload::{NoopRefresher, RefreshGate, RefreshOutcome, WorkspaceRefresher};
use crate::session::{AttachOptions, ReplSession, SessionConnector, TcpConnector};

/// Resolved outcome of a launch.
///
/// Exactly one outcome is produced per [`WaitHandle`]; the losing race
/// paths become no-ops.
pub enum LaunchOutcome {
    /// The runtime acked and a session was attached.
    Connected(ReplSession),
    /// No ack arrived within the timeout; termination was requested.
    TimedOut,
    /// The wait was cancelled; termination was requested.
    Cancelled,
    /// The ack arrived but the session could not be attached. The
    /// runtime is left running.
    Failed(LaunchError),
}

impl LaunchOutcome {
    pub fn phase(&self) -> LaunchPhase {
        match self {
            LaunchOutcome::Connected(_) => LaunchPhase::Connected,
            LaunchOutcome::TimedOut => LaunchPhase::TimedOut,
            LaunchOutcome::Cancelled => LaunchPhase::Cancelled,
            LaunchOutcome::Failed(_) => LaunchPhase::Failed,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, LaunchOutcome::Connected(_))
    }
}

impl std::fmt::Debug for LaunchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchOutcome::Connected(session) => {
                write!(f, "Connected({})", session.endpoint())
            }
            LaunchOutcome::TimedOut => write!(f, "TimedOut"),
            LaunchOutcome::Cancelled => write!(f, "Cancelled"),
            LaunchOutcome::Failed(e) => write!(f, "Failed({})", e),
        }
    }
}

/// In-flight wait for a runtime ack.
///
/// Owned exclusively by the caller and consumed by
/// [`LaunchAckCoordinator::wait`], so an outcome is resolved at most
/// once per launch and a late ack can never trigger a second attach.
pub struct WaitHandle {
    request: LaunchRequest,
    process: Box<dyn LaunchedProcess>,
    ack_rx: oneshot::Receiver<LaunchResult<AckToken>>,
    ack_task: JoinHandle<()>,
    cancel: CancellationToken,
    state: LaunchState,
}

impl WaitHandle {
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    pub fn launch_id(&self) -> &str {
        &self.request.launch_id
    }

    pub fn state(&self) -> &LaunchState {
        &self.state
    }

    /// Token for the external cancel surface. Cancelling it unblocks the
    /// wait, terminates the runtime, and resolves the launch as
    /// [`LaunchOutcome::Cancelled`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Coordinates a runtime launch with its readiness ack and the session
/// attach that follows.
pub struct LaunchAckCoordinator {
    launcher: Arc<dyn ProcessLauncher>,
    connector: Arc<dyn SessionConnector>,
    refresher: Arc<dyn WorkspaceRefresher>,
    refresh_bound: Duration,
}

impl LaunchAckCoordinator {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        connector: Arc<dyn SessionConnector>,
        refresher: Arc<dyn WorkspaceRefresher>,
    ) -> Self {
        Self {
            launcher,
            connector,
            refresher,
            refresh_bound: Duration::from_millis(timeouts::REFRESH_WAIT_MS),
        }
    }

    /// Coordinator with the default collaborators: `tokio::process`
    /// launcher, plain TCP connector, no workspace refresh.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(CommandLauncher::new()),
            Arc::new(TcpConnector::new()),
            Arc::new(NoopRefresher),
        )
    }

    /// Override the bound on the pre-attach refresh wait.
    pub fn with_refresh_bound(mut self, bound: Duration) -> Self {
        self.refresh_bound = bound;
        self
    }

    /// Spawn the runtime and begin listening for its ack.
    ///
    /// Non-blocking: returns as soon as the process is spawned. The
    /// ack listener is bound before the spawn so the runtime can never
    /// ack into the void.
    pub async fn start(&self, request: LaunchRequest) -> LaunchResult<WaitHandle> {
        let listener = AckListener::bind().await?;
        let ack_port = listener.port();

        let process = self.launcher.launch(&request, ack_port).await?;
        let state = LaunchState::new(process.pid());

        let (ack_tx, ack_rx) = oneshot::channel();
        let ack_task = tokio::spawn(async move {
            // A dropped receiver means the outcome already resolved;
            // the late ack is ignored.
            let _ = ack_tx.send(listener.accept_token().await);
        });

        tracing::debug!(
            launch_id = %request.launch_id,
            ack_port = ack_port,
            pid = state.pid,
            "runtime started, waiting for ack"
        );

        Ok(WaitHandle {
            request,
            process,
            ack_rx,
            ack_task,
            cancel: CancellationToken::new(),
            state,
        })
    }

    /// Block until the launch resolves: ack arrival, timeout, or
    /// cancellation, whichever comes first.
    ///
    /// On ack, the workspace refresh gate runs to completion (or its
    /// bound) before the session attach begins. Timeout and cancellation
    /// request termination of the runtime exactly once; an attach
    /// failure leaves it running.
    pub async fn wait(
        &self,
        handle: WaitHandle,
        timeout: Duration,
        options: AttachOptions,
    ) -> LaunchOutcome {
        let WaitHandle {
            request,
            process,
            mut ack_rx,
            ack_task,
            cancel,
            mut state,
        } = handle;

        let outcome = tokio::select! {
            ack = &mut ack_rx => match ack {
                Ok(Ok(token)) => {
                    self.connect(&request, token, &options, process.as_ref()).await
                }
                Ok(Err(e)) => LaunchOutcome::Failed(e),
                Err(_) => LaunchOutcome::Failed(LaunchError::Internal(
                    "ack channel closed before a token arrived".into(),
                )),
            },
            _ = tokio::time::sleep(timeout) => {
                match process.exit_status().await {
                    Some(code) => tracing::error!(
                        launch_id = %request.launch_id,
                        exit_code = code,
                        "runtime exited before acking"
                    ),
                    None => tracing::error!(
                        launch_id = %request.launch_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "timed out waiting for runtime ack"
                    ),
                }
                if let Err(e) = process.terminate().await {
                    tracing::warn!("failed to terminate runtime after timeout: {}", e);
                }
                LaunchOutcome::TimedOut
            },
            _ = cancel.cancelled() => {
                tracing::info!(launch_id = %request.launch_id, "launch cancelled, terminating runtime");
                if let Err(e) = process.terminate().await {
                    tracing::warn!("failed to terminate runtime after cancel: {}", e);
                }
                LaunchOutcome::Cancelled
            },
        };

        ack_task.abort();
        if let Err(e) = state.transition_to(outcome.phase()) {
            tracing::warn!("launch state transition rejected: {}", e);
        }
        tracing::info!(
            launch_id = %request.launch_id,
            phase = %state.phase,
            "launch resolved"
        );
        outcome
    }

    /// Ack arrived: run the refresh gate, then attach the session.
    async fn connect(
        &self,
        request: &LaunchRequest,
        token: AckToken,
        options: &AttachOptions,
        process: &dyn LaunchedProcess,
    ) -> LaunchOutcome {
        let endpoint = Endpoint::local(token.port());

        let gate = RefreshGate::new(self.refresh_bound);
        match gate.run(self.refresher.clone(), request.auto_reload).await {
            RefreshOutcome::Failed(e) => {
                tracing::error!("workspace refresh failed: {}", e);
                options
                    .console
                    .append(&format!("workspace refresh failed: {}", e));
            }
            RefreshOutcome::TimedOut
            | RefreshOutcome::Completed
            | RefreshOutcome::Skipped => {}
        }

        if let Some(pid) = process.pid()
            && let Some(snapshot) = stats::sample(pid)
        {
            tracing::debug!(
                pid = pid,
                memory_mib = snapshot.memory_mib(),
                "runtime process snapshot"
            );
        }

        match self.connector.attach(&endpoint, options).await {
            Ok(session) => {
                tracing::info!(endpoint = %endpoint, "session attached");
                LaunchOutcome::Connected(session)
            }
            Err(e) => {
                // The runtime is deliberately left running; a failed
                // attach requires a new manual launch, not a kill.
                tracing::error!(endpoint = %endpoint, "could not attach session: {}", e);
                LaunchOutcome::Failed(e)
            }
        }
    }
}
