//! Display consoles for launch and session output.
//!
//! The console a session renders into is request-scoped: callers pick
//! one explicitly in [`crate::session::AttachOptions`] instead of the
//! launcher guessing from whichever console happened to open last.

use std::sync::Mutex;

/// Sink for human-readable launch and session output.
pub trait ConsoleSink: Send + Sync {
    /// Append one line of output.
    fn append(&self, line: &str);

    /// Bring the console to the foreground. No-op by default.
    fn activate(&self) {}
}

/// Console that discards everything.
pub struct NullConsole;

impl ConsoleSink for NullConsole {
    fn append(&self, _line: &str) {}
}

/// Console that forwards lines into tracing under a named target.
pub struct TracingConsole {
    name: String,
}

impl TracingConsole {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ConsoleSink for TracingConsole {
    fn append(&self, line: &str) {
        tracing::info!(target: "repl:console", console = %self.name, "{}", line);
    }

    fn activate(&self) {
        tracing::debug!(target: "repl:console", console = %self.name, "console activated");
    }
}

/// In-memory console, useful for embedding and tests.
#[derive(Default)]
pub struct BufferConsole {
    lines: Mutex<Vec<String>>,
    activated: Mutex<bool>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn was_activated(&self) -> bool {
        self.activated.lock().map(|a| *a).unwrap_or(false)
    }
}

impl ConsoleSink for BufferConsole {
    fn append(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    fn activate(&self) {
        if let Ok(mut activated) = self.activated.lock() {
            *activated = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_collects_lines() {
        let console = BufferConsole::new();
        console.append("first");
        console.append("second");
        assert_eq!(console.lines(), vec!["first", "second"]);
        assert!(!console.was_activated());

        console.activate();
        assert!(console.was_activated());
    }
}
