//! Launcher defaults, loaded from a YAML config file.

use std::path::Path;

use anyhow::Context;
use replaunch::constants::{repl, timeouts};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Time to wait for the runtime's ack, in milliseconds.
    pub ack_timeout_ms: u64,

    /// Bound on the pre-attach workspace refresh wait, in milliseconds.
    pub refresh_timeout_ms: u64,

    /// Refresh the workspace before attaching the session.
    pub auto_reload: bool,

    /// Namespace a fresh session starts in.
    pub initial_namespace: String,

    /// Bring the console to the foreground once attached.
    pub activate_console: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: timeouts::ACK_TIMEOUT_MS,
            refresh_timeout_ms: timeouts::REFRESH_WAIT_MS,
            auto_reload: false,
            initial_namespace: repl::DEFAULT_NAMESPACE.to_string(),
            activate_console: true,
        }
    }
}

/// Load the launcher config.
///
/// An explicitly given path must exist; the default location is
/// optional and silently falls back to defaults when absent.
pub fn load(path: Option<&Path>) -> anyhow::Result<LauncherConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match dirs::config_dir() {
            Some(dir) => (dir.join("replaunch").join("config.yaml"), false),
            None => return Ok(LauncherConfig::default()),
        },
    };

    if !path.exists() {
        if required {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(LauncherConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LauncherConfig::default();
        assert_eq!(config.ack_timeout_ms, 600_000);
        assert_eq!(config.initial_namespace, "user");
        assert!(!config.auto_reload);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LauncherConfig = serde_yaml::from_str("auto_reload: true\n").unwrap();
        assert!(config.auto_reload);
        assert_eq!(config.ack_timeout_ms, 600_000);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let result = load(Some(Path::new("/nonexistent/replaunch.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "initial_namespace: app.core\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.initial_namespace, "app.core");
    }
}
