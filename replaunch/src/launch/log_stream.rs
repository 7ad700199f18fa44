//! Log streaming from the runtime's stdout/stderr into tracing.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;

use crate::session::ConsoleSink;

/// Log level for runtime output streams.
#[derive(Debug, Clone, Copy)]
enum StreamLevel {
    Debug,
    Warn,
}

/// Forwards runtime stdout/stderr lines into the launcher's tracing
/// system, and into the launch console when one is attached.
///
/// Each stream gets a dedicated task reading lines until the pipe
/// closes. ANSI escape codes are stripped so colored runtime output is
/// not double-formatted by our own subscriber.
pub(super) struct LogStreamHandler {
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl LogStreamHandler {
    pub(super) fn new(
        stdout: ChildStdout,
        stderr: ChildStderr,
        console: Option<Arc<dyn ConsoleSink>>,
    ) -> Self {
        let stdout_task = spawn_reader(
            BufReader::new(stdout),
            "stdout",
            StreamLevel::Debug,
            console.clone(),
        );
        let stderr_task = spawn_reader(BufReader::new(stderr), "stderr", StreamLevel::Warn, console);

        Self {
            stdout_task,
            stderr_task,
        }
    }

    /// Wait for both reader tasks to drain their pipes.
    ///
    /// Call after the runtime has exited; the tasks finish when they hit
    /// EOF.
    pub(super) async fn shutdown(self) {
        let (stdout, stderr) = futures::future::join(self.stdout_task, self.stderr_task).await;
        if let Err(e) = stdout {
            tracing::warn!(target: "runtime:stdout", "stdout reader task failed: {}", e);
        }
        if let Err(e) = stderr {
            tracing::warn!(target: "runtime:stderr", "stderr reader task failed: {}", e);
        }
    }
}

fn spawn_reader<R>(
    reader: R,
    stream_name: &'static str,
    level: StreamLevel,
    console: Option<Arc<dyn ConsoleSink>>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let clean = strip_ansi_codes(&line);
                    match level {
                        StreamLevel::Debug => {
                            tracing::debug!(target: "runtime:stdout", "{}", clean)
                        }
                        StreamLevel::Warn => tracing::warn!(target: "runtime:stderr", "{}", clean),
                    }
                    if let Some(console) = &console {
                        console.append(&clean);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(
                        stream = stream_name,
                        "failed to read from runtime pipe: {}",
                        e
                    );
                    break;
                }
            }
        }
        tracing::debug!(stream = stream_name, "runtime pipe closed");
    })
}

/// Strip `\x1b[...m` color sequences from a line.
fn strip_ansi_codes(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.next() == Some('[') {
                for escaped in chars.by_ref() {
                    if escaped == 'm' {
                        break;
                    }
                }
            }
        } else {
            clean.push(c);
        }
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("plain"), "plain");
        assert_eq!(strip_ansi_codes("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(strip_ansi_codes("\x1b[1;32mbold\x1b[0m"), "bold");
    }
}
