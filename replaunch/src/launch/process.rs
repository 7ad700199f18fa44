//! Process-launch collaborator traits and the default implementation.

use std::sync::Arc;

use async_trait::async_trait;
use replaunch_shared::{LaunchError, LaunchResult};
use tokio::process::Child;
use tokio::sync::Mutex;

use super::log_stream::LogStreamHandler;
use super::{LaunchRequest, spawn};
use crate::session::ConsoleSink;

/// Spawns a runtime process for a launch request.
///
/// The coordinator owns the ack listener; the launcher only receives the
/// port the runtime should ack to.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(
        &self,
        request: &LaunchRequest,
        ack_port: u16,
    ) -> LaunchResult<Box<dyn LaunchedProcess>>;
}

/// Handle to a spawned runtime process.
#[async_trait]
pub trait LaunchedProcess: Send + Sync {
    /// OS process id, if the process was spawned successfully.
    fn pid(&self) -> Option<u32>;

    /// Exit status if the process has already terminated.
    ///
    /// Returns `Some(code)` once exited (`-1` when killed by a signal),
    /// `None` while still running.
    async fn exit_status(&self) -> Option<i32>;

    /// Request termination of the process.
    ///
    /// Idempotent: safe to call repeatedly, and logs rather than raising
    /// when the process has already exited.
    async fn terminate(&self) -> LaunchResult<()>;
}

/// Default launcher backed by `tokio::process::Command`.
///
/// Stdout/stderr of the runtime are piped into tracing (and the launch
/// console, when one is supplied).
#[derive(Default)]
pub struct CommandLauncher {
    console: Option<Arc<dyn ConsoleSink>>,
}

impl CommandLauncher {
    pub fn new() -> Self {
        Self { console: None }
    }

    /// Echo runtime output into `console` in addition to tracing.
    pub fn with_console(console: Arc<dyn ConsoleSink>) -> Self {
        Self {
            console: Some(console),
        }
    }
}

#[async_trait]
impl ProcessLauncher for CommandLauncher {
    async fn launch(
        &self,
        request: &LaunchRequest,
        ack_port: u16,
    ) -> LaunchResult<Box<dyn LaunchedProcess>> {
        let mut child = spawn::spawn_runtime(request, ack_port)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            let _ = child.start_kill();
            LaunchError::Launch("failed to capture runtime stdout".into())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            let _ = child.start_kill();
            LaunchError::Launch("failed to capture runtime stderr".into())
        })?;
        let log_handler = LogStreamHandler::new(stdout, stderr, self.console.clone());

        let pid = child.id();
        tracing::info!(
            launch_id = %request.launch_id,
            pid = pid,
            ack_port = ack_port,
            "runtime process spawned"
        );

        Ok(Box::new(RuntimeProcess {
            pid,
            launch_id: request.launch_id.clone(),
            inner: Mutex::new(ProcessState {
                child: Some(child),
                log_handler: Some(log_handler),
                exit_code: None,
            }),
        }))
    }
}

struct ProcessState {
    child: Option<Child>,
    log_handler: Option<LogStreamHandler>,
    exit_code: Option<i32>,
}

/// A runtime process spawned by [`CommandLauncher`].
pub struct RuntimeProcess {
    pid: Option<u32>,
    launch_id: String,
    inner: Mutex<ProcessState>,
}

impl RuntimeProcess {
    /// Reap the child and remember its exit code. Caller holds the lock.
    async fn reap(state: &mut ProcessState) {
        if let Some(mut child) = state.child.take() {
            match child.wait().await {
                Ok(status) => state.exit_code = Some(status.code().unwrap_or(-1)),
                Err(e) => tracing::warn!("failed to reap runtime process: {}", e),
            }
        }
        if let Some(handler) = state.log_handler.take() {
            handler.shutdown().await;
        }
    }
}

#[async_trait]
impl LaunchedProcess for RuntimeProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn exit_status(&self) -> Option<i32> {
        let mut state = self.inner.lock().await;
        if let Some(child) = state.child.as_mut() {
            match child.try_wait() {
                Ok(Some(_)) => Self::reap(&mut state).await,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!("failed to query runtime exit status: {}", e);
                    return None;
                }
            }
        }
        state.exit_code
    }

    async fn terminate(&self) -> LaunchResult<()> {
        let mut state = self.inner.lock().await;

        let Some(child) = state.child.as_mut() else {
            tracing::debug!(
                launch_id = %self.launch_id,
                "terminate requested but runtime already reaped"
            );
            return Ok(());
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(
                    launch_id = %self.launch_id,
                    status = ?status.code(),
                    "terminate requested but runtime already exited"
                );
            }
            Ok(None) => {
                tracing::info!(launch_id = %self.launch_id, pid = self.pid, "terminating runtime process");
                if let Err(e) = child.start_kill() {
                    // Termination failure is logged, never raised.
                    tracing::warn!(
                        launch_id = %self.launch_id,
                        "failed to kill runtime process: {}", e
                    );
                }
            }
            Err(e) => {
                tracing::warn!(launch_id = %self.launch_id, "failed to query runtime before terminate: {}", e);
            }
        }

        Self::reap(&mut state).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(program: &str, args: &[&str]) -> LaunchRequest {
        LaunchRequest::new(program)
            .with_attach_repl(false)
            .with_user_args(args.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_terminate_twice_after_exit_is_ok() {
        let launcher = CommandLauncher::new();
        let request = request_for("sh", &["-c", "exit 0"]);

        let process = launcher.launch(&request, 9999).await.unwrap();

        // Let the child exit on its own, then terminate twice.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        process.terminate().await.unwrap();
        process.terminate().await.unwrap();
        assert_eq!(process.exit_status().await, Some(0));
    }

    #[tokio::test]
    async fn test_terminate_kills_running_process() {
        let launcher = CommandLauncher::new();
        let request = request_for("sh", &["-c", "sleep 60"]);

        let process = launcher.launch(&request, 9999).await.unwrap();
        assert!(process.pid().is_some());
        assert_eq!(process.exit_status().await, None);

        process.terminate().await.unwrap();
        assert!(process.exit_status().await.is_some());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_launch_error() {
        let launcher = CommandLauncher::new();
        let request = request_for("/nonexistent/runtime-binary", &[]);

        let result = launcher.launch(&request, 9999).await;
        assert!(matches!(result, Err(LaunchError::Launch(_))));
    }
}
