//! Subprocess spawning for the runtime process.

use std::process::Stdio;

use replaunch_shared::constants::env;
use replaunch_shared::{LaunchError, LaunchResult};
use tokio::process::{Child, Command};

use super::{LaunchRequest, classpath};

/// Spawn the runtime described by `request` with piped stdout/stderr.
///
/// The ack port and launch id are exported through the child
/// environment; the generated argument list points the runtime's REPL
/// bootstrap at the same ack port.
pub(super) fn spawn_runtime(request: &LaunchRequest, ack_port: u16) -> LaunchResult<Child> {
    let mut cmd = Command::new(&request.program);
    cmd.args(request.command_line(ack_port));

    if let Some(dir) = &request.working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in &request.env {
        cmd.env(key, value);
    }
    cmd.env(env::LAUNCH_ID, &request.launch_id);
    cmd.env(env::ACK_PORT, ack_port.to_string());
    if !request.classpath.is_empty() {
        cmd.env(env::CLASSPATH, classpath::render(&request.classpath));
    }

    // Capture output for controlled logging; null stdin so the runtime
    // cannot block on the launcher's terminal.
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    if let Ok(json) = serde_json::to_string(request) {
        tracing::trace!(request = %json, "launch request");
    }

    cmd.spawn().map_err(|e| {
        LaunchError::Launch(format!(
            "failed to spawn runtime {}: {}",
            request.program.display(),
            e
        ))
    })
}
