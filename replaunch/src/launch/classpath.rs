//! Classpath assembly for runtime launches.
//!
//! Source directories are moved to the front so freshly edited code
//! shadows anything packaged, and the bundled REPL server library is
//! appended only when the project does not already ship one.

use std::path::{Path, PathBuf};

use replaunch_shared::{LaunchError, LaunchResult};

/// Prepend source directories to a classpath.
///
/// Existing occurrences of a source directory are removed first so each
/// entry appears exactly once, at the front, in the order given.
pub fn with_source_paths(classpath: Vec<PathBuf>, source_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = classpath
        .into_iter()
        .filter(|entry| !source_dirs.contains(entry))
        .collect();

    for dir in source_dirs.iter().rev() {
        entries.insert(0, dir.clone());
    }
    entries
}

/// Append the bundled REPL server library unless the project provides
/// its own.
///
/// `project_provides_server` is decided by the caller (the launcher
/// cannot inspect foreign project metadata). When the bundled library is
/// needed it must exist on disk; a missing file is a configuration
/// error, not something to discover at runtime startup.
pub fn ensure_repl_server(
    classpath: Vec<PathBuf>,
    bundled_lib: &Path,
    project_provides_server: bool,
) -> LaunchResult<Vec<PathBuf>> {
    if project_provides_server {
        tracing::debug!(
            "project already provides a REPL server library, not adding {}",
            bundled_lib.display()
        );
        return Ok(classpath);
    }

    if !bundled_lib.exists() {
        return Err(LaunchError::Config(format!(
            "bundled REPL server library not found: {}",
            bundled_lib.display()
        )));
    }

    let mut entries = classpath;
    if !entries.iter().any(|e| e == bundled_lib) {
        tracing::debug!(
            "adding bundled REPL server library to classpath: {}",
            bundled_lib.display()
        );
        entries.push(bundled_lib.to_path_buf());
    }
    Ok(entries)
}

/// Render a classpath using the platform path separator.
pub fn render(classpath: &[PathBuf]) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    classpath
        .iter()
        .map(|e| e.display().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_source_paths_prepended_in_order() {
        let classpath = paths(&["lib/a.jar", "lib/b.jar"]);
        let sources = paths(&["src", "test"]);

        let result = with_source_paths(classpath, &sources);
        assert_eq!(result, paths(&["src", "test", "lib/a.jar", "lib/b.jar"]));
    }

    #[test]
    fn test_duplicate_source_path_removed_before_prepend() {
        let classpath = paths(&["lib/a.jar", "src", "lib/b.jar", "src"]);
        let sources = paths(&["src"]);

        let result = with_source_paths(classpath, &sources);
        assert_eq!(result, paths(&["src", "lib/a.jar", "lib/b.jar"]));
    }

    #[test]
    fn test_repl_server_appended_when_missing_from_project() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("repl-server.jar");
        std::fs::write(&lib, b"jar").unwrap();

        let result = ensure_repl_server(paths(&["src"]), &lib, false).unwrap();
        assert_eq!(result.last().unwrap(), &lib);
    }

    #[test]
    fn test_repl_server_skipped_when_project_provides_one() {
        let result =
            ensure_repl_server(paths(&["src"]), Path::new("/nonexistent/lib.jar"), true).unwrap();
        assert_eq!(result, paths(&["src"]));
    }

    #[test]
    fn test_missing_bundled_library_is_config_error() {
        let result = ensure_repl_server(Vec::new(), Path::new("/nonexistent/lib.jar"), false);
        assert!(matches!(result, Err(LaunchError::Config(_))));
    }

    #[test]
    fn test_render_joins_entries() {
        let rendered = render(&paths(&["src", "lib/a.jar"]));
        if cfg!(windows) {
            assert_eq!(rendered, "src;lib/a.jar");
        } else {
            assert_eq!(rendered, "src:lib/a.jar");
        }
    }
}
