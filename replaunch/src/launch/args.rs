//! Program-argument assembly for runtime launches.
//!
//! Three launch shapes exist:
//!
//! - REPL launch: inject an init expression that starts an in-process
//!   REPL server pointed at our ack port, then file loads, then the
//!   user's own arguments.
//! - Script launch: file arguments followed by the user's arguments.
//! - Project-tool launch: the tool owns its argument list; file-load
//!   injections are spliced in front of the headless-REPL marker.

use std::path::{Path, PathBuf};

use replaunch_shared::constants::repl;

use super::LaunchRequest;

/// Assemble the full argument list for a launch.
pub(super) fn assemble(request: &LaunchRequest, ack_port: u16) -> Vec<String> {
    if request.project_tool {
        return splice_load_injections(&request.user_args, &request.files_to_load);
    }

    let mut argv = Vec::new();

    if request.attach_repl {
        if let Some(script) = &request.tooling_script {
            argv.push("-i".to_string());
            argv.push(script.display().to_string());
        }
        argv.push("-e".to_string());
        argv.push(repl_init_expression(ack_port));
        for file in &request.files_to_load {
            argv.push("-i".to_string());
            argv.push(file.display().to_string());
        }
    } else {
        for file in &request.files_to_load {
            argv.push(file.display().to_string());
        }
    }

    argv.extend(request.user_args.iter().cloned());
    argv
}

/// Init expression that starts a REPL server acking back to `ack_port`.
///
/// Wrapped in `(do ... nil)` so the server handle is not printed to the
/// process console.
fn repl_init_expression(ack_port: u16) -> String {
    format!(
        "(require 'nrepl.server)(do (nrepl.server/start-server :ack-port {}) nil)",
        ack_port
    )
}

/// Splice file-load injections into a project-tool argument list.
///
/// The injections are inserted immediately before the `repl :headless`
/// marker so the tool evaluates them inside the project context. When no
/// files are requested, or the marker is absent, the arguments pass
/// through unchanged.
pub fn splice_load_injections(tool_args: &[String], files: &[PathBuf]) -> Vec<String> {
    if files.is_empty() {
        return tool_args.to_vec();
    }

    let Some(marker) = headless_marker_position(tool_args) else {
        tracing::warn!("project-tool arguments carry no headless REPL marker, skipping file-load injections");
        return tool_args.to_vec();
    };

    let mut argv = tool_args[..marker].to_vec();
    argv.push("update-in".to_string());
    argv.push(":injections".to_string());
    argv.push("conj".to_string());
    argv.push(load_injection_forms(files));
    argv.push("--".to_string());
    argv.extend(tool_args[marker..].iter().cloned());
    argv
}

fn headless_marker_position(args: &[String]) -> Option<usize> {
    args.windows(repl::HEADLESS_MARKER.len())
        .position(|w| w.iter().map(String::as_str).eq(repl::HEADLESS_MARKER))
}

/// One guarded load form per file, so a broken file does not abort the
/// whole startup. `load` is used (rather than `load-file`) so the paths
/// stay classpath-relative and line info survives for debuggers.
fn load_injection_forms(files: &[PathBuf]) -> String {
    let mut forms = String::new();
    for file in files {
        forms.push_str(&format!(
            "(try (load \"{}\") (catch Exception e (.printStackTrace e)))",
            classpath_relative_stem(file)
        ));
    }
    forms
}

/// Strip the source extension so the path names a loadable namespace
/// root, e.g. `src/app/core.clj` -> `src/app/core`.
fn classpath_relative_stem(file: &Path) -> String {
    let rendered = file.display().to_string();
    match rendered.rfind(".clj") {
        Some(offset) => rendered[..offset].to_string(),
        None => rendered,
    }
}
